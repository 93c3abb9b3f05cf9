use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use texpilot_app::display::{model_label, render, Rendered, SessionState};
use texpilot_app::pipeline;
use texpilot_common::observability::{init_logging, LogConfig};
use texpilot_config::SettingsLoader;

/// Generate LaTeX from a prompt plus the document visible in a saved
/// editor page snapshot.
#[derive(Parser, Debug)]
#[command(name = "texpilot", version)]
struct Cli {
    /// Saved HTML snapshot of the editor page
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// What to generate, e.g. "add a table with three columns"
    #[arg(long)]
    prompt: Option<String>,

    /// Settings file (api_key, model)
    #[arg(long, default_value = "texpilot.yaml", value_name = "FILE")]
    config: PathBuf,

    /// Verify key and connectivity with a canned prompt, then exit
    #[arg(long)]
    test: bool,

    /// Override the API endpoint (local testing)
    #[arg(long, env = "TEXPILOT_API_URL", value_name = "URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = SettingsLoader::new()
        .with_file(&cli.config)
        .load()
        .context("loading settings")?;
    let log_path = init_logging(LogConfig::default())?;
    tracing::debug!(log = %log_path.display(), "texpilot starting");

    if cli.test {
        let reply = pipeline::test_connection(&settings, cli.api_url.as_deref()).await?;
        println!("Connection works. Model says:\n{reply}");
        return Ok(());
    }

    let snapshot = cli
        .snapshot
        .context("--snapshot is required unless --test is given")?;
    let prompt = cli.prompt.unwrap_or_default();
    let html = std::fs::read_to_string(&snapshot)
        .with_context(|| format!("reading snapshot {}", snapshot.display()))?;

    let state = SessionState::Awaiting;
    eprintln!("{}", state.status());

    let outcome =
        match pipeline::generate_from_snapshot(&html, &prompt, &settings, cli.api_url.as_deref())
            .await
        {
            Ok(outcome) => outcome,
            // Document-side failures: extraction, missing key, dead relay.
            Err(err) => {
                eprintln!("Error: {err:#}");
                std::process::exit(1);
            }
        };

    let rendered = render(&outcome.envelope);
    let state = SessionState::Done(outcome.envelope);
    match rendered {
        Rendered::Output(text) => {
            eprintln!(
                "{} with {} ({})",
                state.status(),
                model_label(&outcome.model),
                outcome.context_preview
            );
            println!("{text}");
            Ok(())
        }
        Rendered::Error(message) => {
            eprintln!("{}: {message}", state.status());
            std::process::exit(1);
        }
    }
}
