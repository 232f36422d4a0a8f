use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use homefit::config::{load_category_candidates, Cli, Command, ServeArgs};
use homefit::db::{Database, Exercise};
use homefit::ingest::Ingestor;
use homefit::llm::{Advisor, OpenAiAdvisor};
use homefit::server::{make_server, AppState};
use homefit::session::SessionStore;
use homefit::youtube::YouTubeClient;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment and flags still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homefit=info,warp=info")),
        )
        .init();

    let cli = Cli::parse();
    let db = Database::file(&cli.database)
        .with_context(|| format!("opening database {}", cli.database.display()))?;

    match cli.command {
        Command::Serve(args) => serve(db, args).await,
        Command::ImportExercises { file } => import_exercises(db, &file).await,
    }
}

async fn serve(db: Database, args: ServeArgs) -> anyhow::Result<()> {
    let candidates = match &args.categories {
        Some(path) => load_category_candidates(path)
            .with_context(|| format!("reading categories from {}", path.display()))?,
        None => Vec::new(),
    };
    info!(candidates = candidates.len(), "category candidates loaded");

    let advisor: Arc<dyn Advisor> = Arc::new(OpenAiAdvisor::new(args.llm_config())?);
    let source = Arc::new(YouTubeClient::new(
        args.youtube_api_base.as_str(),
        args.youtube_api_key.clone(),
    )?);

    let state = AppState {
        ingestor: Ingestor::new(&db, source, Arc::clone(&advisor), candidates),
        db,
        sessions: SessionStore::new(),
        advisor,
    };

    info!(listen = %args.listen, "starting server");
    warp::serve(make_server(state)).run(args.listen).await;

    Ok(())
}

async fn import_exercises(db: Database, file: &std::path::Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let exercises: Vec<Exercise> = serde_json::from_str(&contents)?;

    for exercise in &exercises {
        db.put_exercise(exercise)?;
    }
    info!(count = exercises.len(), "exercises imported");

    Ok(())
}
