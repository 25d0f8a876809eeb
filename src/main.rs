//! graderace CLI - summarise a race result page
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use clap::Parser;
use graderace::config::Overrides;
use graderace::{logging, output, scraper, Config, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "graderace")]
#[command(author, version, about = "Summarise a horse-race result page with Gemini", long_about = None)]
struct Cli {
    /// URL of the race data page
    url: String,
    /// Model to use; any name containing "pro" selects the pro model
    #[arg(short, long, value_name = "NAME")]
    model: Option<String>,
    /// Print the extracted text instead of summarising it
    #[arg(long)]
    raw: bool,
    /// Do not copy the summary to the clipboard
    #[arg(long)]
    no_clipboard: bool,
    /// Config file (default: graderace.toml or ~/.config/graderace/graderace.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())
        .context("loading configuration")?
        .with_overrides(Overrides {
            model: cli.model,
            no_clipboard: cli.no_clipboard,
        });

    if cli.raw {
        // No summariser, so no API key needed
        let content = scraper::fetch_content(&cli.url, &config.scraper).await?;
        println!("{}", content.text);
        return Ok(());
    }

    let mut sinks = output::default_sinks(config.output.clipboard);
    let pipeline = Pipeline::new(config)?;
    pipeline.run_and_deliver(&cli.url, &mut sinks).await?;

    Ok(())
}
