//! The digest pipeline: validate, retrieve, assemble, summarize.
//!
//! Each run walks the steps strictly in order and stops at the first terminal
//! state. Nothing is retried and nothing is kept between runs.

use crate::agent::{self, AgentError, HttpModelResolver, ModelResolver};
use crate::config::{Config, RunConfig};
use crate::prompt::{self, SYSTEM_INSTRUCTION};
use crate::search::{self, SearchError, SearchService, TavilyClient};
use crate::summary::Summary;
use thiserror::Error;
use tracing::{info, warn};

pub const MISSING_INPUT_WARNING: &str = "⚠️ Please enter both API key and a topic.";
pub const NO_EVIDENCE_MESSAGE: &str = "❌ Sorry, no relevant information found for this topic.";

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AwaitingInput,
    Validating,
    Retrieving,
    Assembling,
    Summarizing,
    /// No documents were found
    NoResults,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::NoResults | RunState::Done | RunState::Failed)
    }
}

/// Coarse classification used to pick the rendered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    NoEvidence,
    ServiceFailure,
}

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("{}", MISSING_INPUT_WARNING)]
    MissingInput,
    #[error("{}", NO_EVIDENCE_MESSAGE)]
    NoEvidence,
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Model(#[from] AgentError),
}

impl DigestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DigestError::MissingInput => ErrorKind::MissingInput,
            DigestError::NoEvidence => ErrorKind::NoEvidence,
            DigestError::Search(_) | DigestError::Model(_) => ErrorKind::ServiceFailure,
        }
    }

    /// The terminal state this error ends a run in. Missing input halts
    /// during validation, before the run reaches any terminal state.
    pub fn terminal_state(&self) -> Option<RunState> {
        match self.kind() {
            ErrorKind::MissingInput => None,
            ErrorKind::NoEvidence => Some(RunState::NoResults),
            ErrorKind::ServiceFailure => Some(RunState::Failed),
        }
    }
}

/// Runs the digest steps against a search service and a model resolver.
pub struct DigestPipeline<S, M> {
    search: S,
    models: M,
}

impl DigestPipeline<TavilyClient, HttpModelResolver> {
    /// Wire the pipeline to the real services named in the configuration
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let search = TavilyClient::new(
            config.endpoints.tavily.clone(),
            config.search_key().cloned(),
        )?;
        let models = HttpModelResolver::new(config.endpoints.clone());
        Ok(Self::new(search, models))
    }
}

impl<S, M> DigestPipeline<S, M>
where
    S: SearchService,
    M: ModelResolver,
{
    pub fn new(search: S, models: M) -> Self {
        Self { search, models }
    }

    /// Run once with no progress reporting
    pub async fn run(&self, config: &RunConfig) -> Result<Summary, DigestError> {
        self.run_observed(config, |_| {}).await
    }

    /// Run once, reporting every state the run enters to `observe`.
    pub async fn run_observed<F>(
        &self,
        config: &RunConfig,
        mut observe: F,
    ) -> Result<Summary, DigestError>
    where
        F: FnMut(RunState),
    {
        let result = self.execute(config, &mut observe).await;
        match &result {
            Ok(summary) => {
                info!(chars = summary.text.len(), "Digest complete");
                observe(RunState::Done);
            }
            Err(err) => {
                if err.kind() == ErrorKind::ServiceFailure {
                    warn!(error = %err, "Digest run failed");
                } else {
                    info!(error = %err, "Digest run stopped");
                }
                if let Some(state) = err.terminal_state() {
                    observe(state);
                }
            }
        }
        result
    }

    async fn execute<F>(&self, config: &RunConfig, observe: &mut F) -> Result<Summary, DigestError>
    where
        F: FnMut(RunState),
    {
        observe(RunState::Validating);
        if !config.is_complete() {
            return Err(DigestError::MissingInput);
        }

        observe(RunState::Retrieving);
        info!(topic = %config.topic, "Retrieving evidence");
        let documents = search::retrieve_evidence(&self.search, &config.topic).await?;
        if documents.is_empty() {
            return Err(DigestError::NoEvidence);
        }

        observe(RunState::Assembling);
        let prompt = prompt::assemble(SYSTEM_INSTRUCTION, &documents);

        observe(RunState::Summarizing);
        info!(provider = %config.provider, model = %config.model_name, "Summarizing");
        let summary = agent::summarize(
            &self.models,
            &prompt,
            config.provider,
            &config.model_name,
            &config.credential,
        )
        .await?;

        Ok(summary)
    }
}
