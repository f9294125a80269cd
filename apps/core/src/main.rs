//! SiteChat CLI.
//!
//! Answers widget questions from a JSON file of website records and prints the
//! replies as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::debug;

use sitechat_core::brain::PersonalityOverrides;
use sitechat_core::error::{AppError, ErrorBody};
use sitechat_core::telemetry::{self, LogFormat, DEFAULT_FILTER};
use sitechat_core::{
    normalize_knowledge_base, AppConfig, ChatRequest, ChatResponder, InMemoryWebsiteStore,
    KnowledgeBase, WebsiteService,
};

/// SiteChat: answer website visitor questions from a knowledge base.
#[derive(Parser)]
#[command(name = "sitechat", version, about, long_about = None)]
struct Cli {
    /// Log format; defaults to SITECHAT_LOG_FORMAT or text.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON array of website records; defaults to SITECHAT_DATA_FILE.
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question for the website owning the API key.
    Ask {
        question: String,

        #[arg(short = 'k', long)]
        api_key: String,

        /// Return the matched entry instead of the widget reply.
        #[arg(long)]
        direct: bool,

        /// Personality overrides as JSON, e.g. '{"tone":"professional"}'.
        #[arg(long)]
        personality: Option<String>,
    },

    /// Check an API key and summarize its website.
    Validate {
        #[arg(short = 'k', long)]
        api_key: String,
    },

    /// List the knowledge titles of a website.
    Titles {
        #[arg(short = 'k', long)]
        api_key: String,
    },

    /// Print the canonical entries of a raw knowledge payload.
    Normalize {
        /// Payload file; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Merge entries sharing a title.
        #[arg(long)]
        merge: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid SITECHAT_* configuration")?;

    let filter = match cli.verbose {
        0 => DEFAULT_FILTER,
        1 => "sitechat_core=debug,sitechat=debug",
        _ => "sitechat_core=trace,sitechat=trace",
    };
    telemetry::init(cli.log_format.unwrap_or(config.log_format), filter)?;

    run(cli, config).await
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Ask {
            question,
            api_key,
            direct,
            personality,
        } => {
            let store = load_store(cli.data_file.as_ref(), &config).await?;
            let responder = ChatResponder::new(store, config);

            let mut request = ChatRequest::new(question, api_key);
            if let Some(raw) = personality {
                let overrides: PersonalityOverrides =
                    serde_json::from_str(&raw).context("--personality must be a JSON object")?;
                request = request.with_personality(overrides);
            }

            if direct {
                report(responder.direct_response(&request).await)
            } else {
                report(responder.generate_response(&request).await)
            }
        }
        Command::Validate { api_key } => {
            let store = load_store(cli.data_file.as_ref(), &config).await?;
            let responder = ChatResponder::new(store, config);
            report(responder.validate_api_key(&api_key).await)
        }
        Command::Titles { api_key } => {
            let store = load_store(cli.data_file.as_ref(), &config).await?;
            let service = WebsiteService::new(store);
            let titles = service
                .website_by_api_key(&api_key)
                .await
                .map(|site| site.knowledge.titles().into_iter().map(str::to_string).collect::<Vec<_>>());
            report(titles)
        }
        Command::Normalize { file, merge } => {
            let raw = read_payload(file.as_ref()).await?;
            let payload: Value = serde_json::from_str(&raw).context("Payload is not valid JSON")?;
            if merge {
                print_json(&KnowledgeBase::from_raw(&payload))
            } else {
                print_json(&normalize_knowledge_base(&payload))
            }
        }
    }
}

async fn load_store(
    data_file: Option<&PathBuf>,
    config: &AppConfig,
) -> Result<Arc<InMemoryWebsiteStore>> {
    let path = data_file
        .or(config.data_file.as_ref())
        .context("No data file given; pass --data-file or set SITECHAT_DATA_FILE")?;
    let store = InMemoryWebsiteStore::load_from_file(path)
        .await
        .with_context(|| format!("Failed to load websites from {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn read_payload(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            debug!("Reading payload from stdin");
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the value, or the error envelope before failing.
fn report<T: Serialize>(result: Result<T, AppError>) -> Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            print_json(&ErrorBody::from(&err))?;
            Err(err.into())
        }
    }
}
