use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::llm::{self, LlmConfig};
use crate::youtube;

#[derive(Parser)]
#[command(name = "homefit", about = "Home-training video library and workout planner")]
pub struct Cli {
    /// SQLite file holding users, videos and exercises.
    #[arg(long, env = "HOMEFIT_DATABASE", default_value = "homefit.sqlite", global = true)]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),

    /// Load exercise reference rows from a JSON array.
    ImportExercises {
        file: PathBuf,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, env = "HOMEFIT_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Category candidates offered to the classifier, one per line.
    #[arg(long, env = "HOMEFIT_CATEGORIES")]
    pub categories: Option<PathBuf>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "HOMEFIT_LLM_BASE_URL", default_value = llm::DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    #[arg(long, env = "HOMEFIT_LLM_MODEL", default_value = llm::DEFAULT_MODEL)]
    pub llm_model: String,

    /// Model used for coaching plans.
    #[arg(long, env = "HOMEFIT_LLM_COACH_MODEL", default_value = llm::DEFAULT_COACH_MODEL)]
    pub llm_coach_model: String,

    #[arg(long, env = "HOMEFIT_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,

    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    #[arg(long, env = "HOMEFIT_YOUTUBE_API_BASE", default_value = youtube::DEFAULT_API_BASE)]
    pub youtube_api_base: String,
}

impl ServeArgs {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            coach_model: self.llm_coach_model.clone(),
            api_key: self.openai_api_key.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}

pub fn load_category_candidates(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(parse_category_candidates(&std::fs::read_to_string(path)?))
}

/// One candidate per line; a line may carry several comma-separated levels, which are kept
/// together as a single comma-joined candidate.
pub fn parse_category_candidates(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| {
            line.split(',')
                .map(str::trim)
                .filter(|level| !level.is_empty())
                .collect::<Vec<_>>()
                .join(",")
        })
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::{parse_category_candidates, Cli, Command};

    #[test]
    pub fn test_parse_candidates() {
        let contents = "상체, 가슴, \n\n하체,허벅지,엉덩이\n , ,\n전신\n";
        assert_eq!(
            parse_category_candidates(contents),
            vec!["상체,가슴", "하체,허벅지,엉덩이", "전신"]
        );
    }

    #[test]
    pub fn test_cli() {
        let cli = Cli::try_parse_from([
            "homefit",
            "--database",
            "test.sqlite",
            "serve",
            "--listen",
            "0.0.0.0:9000",
            "--llm-model",
            "gpt-4o",
        ])
        .unwrap();

        assert_eq!(cli.database.to_str(), Some("test.sqlite"));
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.listen.port(), 9000);
                let config = args.llm_config();
                assert_eq!(config.model, "gpt-4o");
                assert_eq!(config.coach_model, "gpt-4o");
            }
            Command::ImportExercises { .. } => panic!("expected serve"),
        }
    }

    #[test]
    pub fn test_coach_model() {
        let cli = Cli::try_parse_from([
            "homefit",
            "serve",
            "--llm-model",
            "gpt-4-turbo",
            "--llm-coach-model",
            "gpt-4.1",
        ])
        .unwrap();

        match cli.command {
            Command::Serve(args) => {
                let config = args.llm_config();
                assert_eq!(config.model, "gpt-4-turbo");
                assert_eq!(config.coach_model, "gpt-4.1");
            }
            Command::ImportExercises { .. } => panic!("expected serve"),
        }
    }
}
