use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use filing_analyst::logging::{self, LogOptions};
use filing_analyst::{Config, DocumentType, FilingQuery, PipelineOrchestrator};

const USER_AGENT: &str = concat!("filing-analyst/", env!("CARGO_PKG_VERSION"));

#[derive(Parser)]
#[command(
    name = "filing-analyst",
    version,
    about = "Locate a company filing and produce a summary plus structured financial data"
)]
struct Cli {
    /// Registered name of the filing organization.
    #[arg(long, env = "FILING_ORGANIZATION")]
    organization: String,
    /// Fiscal year covered by the filing.
    #[arg(long, env = "FILING_FISCAL_YEAR")]
    year: i32,
    /// Filing category (10-K, 10-Q, 8-K, 20-F, 40-F).
    #[arg(long, env = "FILING_DOCUMENT_TYPE", default_value = "10-K")]
    document_type: DocumentType,
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
    /// Log file path.
    #[arg(long, env = "FILING_LOG_FILE")]
    log_file: Option<PathBuf>,
    /// Log to stderr only.
    #[arg(long)]
    console_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing(&LogOptions {
        verbose: cli.verbose,
        file: cli.log_file.clone(),
        console_only: cli.console_only,
    });

    // Dropped when `main` returns, flushing the file layer.
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "filing-analyst aborted");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env().context("failed to load configuration")?;
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;
    let orchestrator = PipelineOrchestrator::from_config(&config, http)
        .context("failed to initialize pipeline")?;

    let query = FilingQuery::new(cli.organization, cli.year, cli.document_type);
    match orchestrator.run(&query).await {
        Ok(result) => {
            let json =
                serde_json::to_string_pretty(&result).context("failed to serialize result")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            let json =
                serde_json::to_string_pretty(&failure).context("failed to serialize failure")?;
            println!("{json}");
            eprintln!("error: {failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}
