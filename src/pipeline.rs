//! Fetch → extract → summarize, one URL per run.

use crate::agent::{AgentError, Summarizer};
use crate::config::Config;
use crate::output::{self, OutputError, Sink};
use crate::scraper::{self, ScraperError};
use crate::summary::Summary;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A configured summarization run
pub struct Pipeline {
    config: Config,
    summarizer: Summarizer,
}

impl Pipeline {
    /// Build the pipeline. The summarizer is constructed here so a missing
    /// API key fails before anything is fetched.
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let summarizer = Summarizer::new(&config.agent, config.api_key())?;
        Ok(Self { config, summarizer })
    }

    /// Summarize the race data at `url`
    pub async fn run(&self, url: &str) -> Result<Summary, PipelineError> {
        let content = scraper::fetch_content(url, &self.config.scraper).await?;
        let summary = self.summarizer.summarize(&content.text).await?;

        tracing::info!(
            model = %summary.model,
            chars = summary.text.chars().count(),
            "summary ready"
        );
        Ok(summary)
    }

    /// Summarize `url` and hand the result to `sinks`. Nothing is emitted
    /// unless every stage succeeded.
    pub async fn run_and_deliver(
        &self,
        url: &str,
        sinks: &mut [Box<dyn Sink>],
    ) -> Result<Summary, PipelineError> {
        let summary = self.run(url).await?;
        output::deliver(&summary.text, sinks)?;
        Ok(summary)
    }
}
