//! Terminal presentation: prompts, progress display, and rendering.
//!
//! Interactive input uses dialoguer, output is styled with colored.

use crate::agent::ModelResolver;
use crate::config::{Config, RunConfig};
use crate::pipeline::{DigestError, DigestPipeline, ErrorKind, RunState};
use crate::provider::Provider;
use crate::search::SearchService;
use crate::summary::Summary;
use chrono::Local;
use colored::Colorize;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

const IDLE_INFO: &str = "Enter a topic and press Enter to generate your news summary.";
const TOPIC_PROMPT: &str = "Enter a topic (e.g., AI News, Cricket World Cup, Tesla Stock, etc.)";

/// Print the title block shown when a session starts
pub fn print_header() {
    println!("{}", "📰 Smart News Summarizer".bold());
    println!("{}", "-".repeat(40));
    println!("📅 Date: {}", Local::now().format("%B %d, %Y").to_string().bold());
    println!("🔍 Enter any topic to get a 5-bullet point summary!\n");
}

/// Print the provider table
pub fn print_providers() {
    println!(
        "{:<20} {:<14} {:<26} {}",
        "PROVIDER".bold(),
        "ID".bold(),
        "DEFAULT MODEL".bold(),
        "CREDENTIAL KEY".bold()
    );
    for spec in Provider::table() {
        println!(
            "{:<20} {:<14} {:<26} {}",
            spec.label, spec.id, spec.default_model, spec.credential_key
        );
    }
}

/// Spinner driven by the pipeline's state changes
pub struct Progress {
    bar: ProgressBar,
    topic: String,
}

impl Progress {
    pub fn new(topic: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        Self {
            bar,
            topic: topic.trim().to_string(),
        }
    }

    pub fn observe(&self, state: RunState) {
        match state {
            RunState::Retrieving => {
                self.bar.enable_steady_tick(Duration::from_millis(100));
                self.bar
                    .set_message(format!("🔍 Searching the web for {}...", self.topic.bold()));
            }
            RunState::Summarizing => {
                self.bar
                    .set_message(format!("🧠 Summarizing news about {}...", self.topic.bold()));
            }
            state if state.is_terminal() => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

const FAILURE_PREFIX: &str = "❌ Something went wrong while generating the summary:";

/// The text shown for the outcome of one run
pub fn format_outcome(topic: &str, outcome: &Result<Summary, DigestError>) -> String {
    match outcome {
        Ok(summary) => format!(
            "{}\n\n{}\n\n{}",
            format!("✅ Summary for {}:", topic.trim()).green().bold(),
            "🧠 Top 5 Bullet Points:".bold(),
            summary
        ),
        Err(err) => match err.kind() {
            ErrorKind::MissingInput => err.to_string().yellow().to_string(),
            ErrorKind::NoEvidence => err.to_string().red().to_string(),
            ErrorKind::ServiceFailure => format!("{} {}", FAILURE_PREFIX.red().bold(), err),
        },
    }
}

/// Render the outcome of one run. Returns the message kind that was shown,
/// or `None` when a digest was printed.
pub fn render(topic: &str, outcome: &Result<Summary, DigestError>) -> Option<ErrorKind> {
    println!("{}", format_outcome(topic, outcome));
    outcome.as_ref().err().map(DigestError::kind)
}

/// Report session states that sit outside a single pipeline run
fn announce(state: RunState) {
    match state {
        RunState::Idle => println!("{}\n", IDLE_INFO.cyan()),
        RunState::AwaitingInput => debug!("Awaiting run input"),
        _ => {}
    }
}

/// Run one digest with a spinner and render the result
pub async fn run_once<S, M>(
    pipeline: &DigestPipeline<S, M>,
    run: &RunConfig,
) -> Option<ErrorKind>
where
    S: SearchService,
    M: ModelResolver,
{
    let progress = Progress::new(&run.topic);
    let outcome = pipeline
        .run_observed(run, |state| progress.observe(state))
        .await;
    progress.finish();
    render(&run.topic, &outcome)
}

/// Ask the operator for provider, API key, model, and topic
fn read_run_config(config: &Config, last: Provider) -> anyhow::Result<RunConfig> {
    let labels: Vec<&str> = Provider::table().iter().map(|spec| spec.label).collect();
    let selection = Select::new()
        .with_prompt("🤖 Choose Model Provider")
        .items(&labels)
        .default(last.index())
        .interact()?;
    let provider = Provider::ALL[selection];

    let typed_key = Password::new()
        .with_prompt(format!("🔑 Enter your {} API Key", provider.label()))
        .allow_empty_password(true)
        .interact()?;

    let model_name: String = Input::new()
        .with_prompt("🧠 Model Name")
        .default(config.model_for(provider))
        .interact_text()?;

    let topic: String = Input::new()
        .with_prompt(TOPIC_PROMPT)
        .allow_empty(true)
        .interact_text()?;

    Ok(session_run(provider, typed_key, model_name, topic))
}

/// Build the run for one interactive submission. The key is used exactly as
/// typed; stored keys only serve one-shot runs.
fn session_run(
    provider: Provider,
    typed_key: String,
    model_name: String,
    topic: String,
) -> RunConfig {
    RunConfig::new(provider, typed_key, model_name, topic)
}

/// Interactive session: one run per submitted topic until the operator stops
pub async fn run_interactive<S, M>(
    pipeline: &DigestPipeline<S, M>,
    config: &Config,
) -> anyhow::Result<()>
where
    S: SearchService,
    M: ModelResolver,
{
    print_header();
    announce(RunState::Idle);

    let mut provider = config.agent.provider;
    loop {
        announce(RunState::AwaitingInput);
        let run = read_run_config(config, provider)?;
        provider = run.provider;

        run_once(pipeline, &run).await;

        let again = Confirm::new()
            .with_prompt("Summarize another topic?")
            .default(true)
            .interact()?;
        if !again {
            break;
        }
        println!();
        announce(RunState::Idle);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credential, EndpointConfig};
    use crate::pipeline::{MISSING_INPUT_WARNING, NO_EVIDENCE_MESSAGE};
    use crate::search::SearchError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plain(topic: &str, outcome: &Result<Summary, DigestError>) -> String {
        colored::control::set_override(false);
        format_outcome(topic, outcome)
    }

    #[test]
    fn formats_digest_with_headings() {
        let text = plain("  AI News ", &Ok(Summary::new("- one\n- two")));
        assert_eq!(
            text,
            "✅ Summary for AI News:\n\n🧠 Top 5 Bullet Points:\n\n- one\n- two"
        );
    }

    #[test]
    fn formats_fixed_messages() {
        assert_eq!(
            plain("", &Err(DigestError::MissingInput)),
            MISSING_INPUT_WARNING
        );
        assert_eq!(
            plain("XYZ123NoNews", &Err(DigestError::NoEvidence)),
            NO_EVIDENCE_MESSAGE
        );
    }

    #[test]
    fn formats_service_failure_with_prefix() {
        let err = DigestError::Search(SearchError::MissingApiKey);
        let text = plain("AI News", &Err(err));
        let expected = format!(
            "❌ Something went wrong while generating the summary: {}",
            DigestError::Search(SearchError::MissingApiKey)
        );
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn empty_typed_key_ignores_stored_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let uri = server.uri();
        let mut config = Config::default();
        config.endpoints = EndpointConfig {
            openai: uri.clone(),
            google_genai: uri.clone(),
            anthropic: uri.clone(),
            mistralai: uri.clone(),
            tavily: uri,
        };
        config.api.tavily_key = Some(Credential::new("tvly-test"));
        config.api.openai_key = Some(Credential::new("from-env"));

        let run = session_run(
            Provider::OpenAi,
            String::new(),
            "gpt-4o-mini".to_string(),
            "AI News".to_string(),
        );
        assert!(run.credential.is_empty());

        let pipeline = DigestPipeline::from_config(&config).unwrap();
        let outcome = pipeline.run(&run).await;
        assert!(matches!(outcome, Err(DigestError::MissingInput)));
    }

    #[test]
    fn announce_handles_session_states() {
        announce(RunState::Idle);
        announce(RunState::AwaitingInput);
        announce(RunState::Done);
    }

    #[test]
    fn render_reports_kind() {
        assert_eq!(render("AI News", &Ok(Summary::new("- one"))), None);
        assert_eq!(
            render("", &Err(DigestError::MissingInput)),
            Some(ErrorKind::MissingInput)
        );
        assert_eq!(
            render("XYZ123NoNews", &Err(DigestError::NoEvidence)),
            Some(ErrorKind::NoEvidence)
        );
        assert_eq!(
            render("AI News", &Err(DigestError::Search(SearchError::MissingApiKey))),
            Some(ErrorKind::ServiceFailure)
        );
    }

    #[test]
    fn progress_tolerates_every_state() {
        let progress = Progress::new("AI News");
        for state in [
            RunState::Idle,
            RunState::AwaitingInput,
            RunState::Validating,
            RunState::Retrieving,
            RunState::Assembling,
            RunState::Summarizing,
            RunState::Done,
        ] {
            progress.observe(state);
        }
        progress.finish();
    }
}
