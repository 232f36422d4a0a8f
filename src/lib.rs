pub mod allocate;
pub mod video;

pub mod calendar;
pub mod coach;
pub mod plan;

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod reply;
pub mod server;
pub mod session;
pub mod youtube;
