
use deep_research_model::ModelProvider;

use crate::conversation::{ConversationHistory, HISTORY_WINDOW, Turn};
use crate::error::{EmptyInputError, SubmitError};
use crate::export::{ExportStrategy, Exports, MarkdownExport};
use crate::model_client::{GenerationClient, GenerationResult};
use crate::present::{Presenter, WidgetStatus, render};
use crate::prompt::{Mode, compose};
use crate::report::ReportConfig;

/// [`Session`] builder.
pub struct SessionBuilder {
    client: GenerationClient,
    mode: Mode,
    exporter: Option<Box<dyn ExportStrategy>>,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The session runs in [`Mode::Chat`] unless told otherwise.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            client: GenerationClient::new(provider),
            mode: Mode::Chat,
            exporter: None,
        }
    }

    /// Sets the pipeline mode.
    #[inline]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets how results are exported. Defaults to a markdown file named
    /// after the mode.
    #[inline]
    pub fn with_exporter<E: ExportStrategy + 'static>(
        mut self,
        exporter: E,
    ) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    /// Builds the session.
    pub fn build(self) -> Session {
        let exporter = self.exporter.unwrap_or_else(|| {
            Box::new(MarkdownExport::new(self.mode.markdown_file_name()))
        });
        Session {
            client: self.client,
            mode: self.mode,
            exporter,
            history: Default::default(),
            last_result: None,
        }
    }
}

/// What a user action ended with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionOutcome {
    /// A result was shown.
    Rendered(WidgetStatus),
    /// The input was rejected before calling the model.
    Rejected,
    /// The model call failed.
    Failed,
}

/// One interactive run of the application.
///
/// The session owns everything that lives between two requests: the
/// conversation, the latest result and the export strategy. It is created
/// at start-up and dropped at exit, nothing outlives it.
pub struct Session {
    client: GenerationClient,
    mode: Mode,
    exporter: Box<dyn ExportStrategy>,
    history: ConversationHistory,
    last_result: Option<GenerationResult>,
}

impl Session {
    /// Returns the pipeline mode.
    #[inline]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Changes the report parameters used by the next request.
    ///
    /// Has no effect outside [`Mode::Report`].
    pub fn set_report_config(&mut self, config: ReportConfig) {
        if let Mode::Report(current) = &mut self.mode {
            *current = config;
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Returns the latest successful result.
    #[inline]
    pub fn last_result(&self) -> Option<&GenerationResult> {
        self.last_result.as_ref()
    }

    /// Runs the pipeline for `query` and returns the result.
    ///
    /// In chat mode the user turn is recorded before the call is made and
    /// stays recorded if the call fails. The assistant turn is only
    /// recorded on success.
    pub async fn submit(
        &mut self,
        query: &str,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> Result<GenerationResult, SubmitError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EmptyInputError.into());
        }

        let prompt =
            compose(&self.mode, self.history.recent(HISTORY_WINDOW), query);
        debug!(
            "composed prompt ({} chars, instruction: {})",
            prompt.content.len(),
            prompt.system_instruction.is_some()
        );

        let keeps_history = self.mode.keeps_history();
        if keeps_history {
            self.history.append(Turn::user(query));
        }

        let result = self.client.generate(prompt.into(), on_delta).await?;
        if keeps_history {
            self.history.append(Turn::assistant(result.text.clone()));
        }
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Handles one submit action end to end, reporting every non-fatal
    /// error on `presenter` instead of returning it.
    pub async fn handle_query(
        &mut self,
        query: &str,
        presenter: &mut dyn Presenter,
    ) -> ActionOutcome {
        if query.trim().is_empty() {
            presenter.warn(&EmptyInputError.to_string());
            return ActionOutcome::Rejected;
        }

        let on_delta = presenter.begin_progress();
        let result_or_err = self.submit(query, on_delta).await;
        presenter.end_progress();

        let result = match result_or_err {
            Ok(result) => result,
            Err(SubmitError::EmptyInput(err)) => {
                presenter.warn(&err.to_string());
                return ActionOutcome::Rejected;
            }
            Err(err) => {
                presenter.error(&err.to_string());
                return ActionOutcome::Failed;
            }
        };

        let status = render(&result, presenter);
        deliver(self.exporter.artifacts(&result), presenter);
        ActionOutcome::Rendered(status)
    }

    /// Exports the latest result, if any.
    pub fn export_latest(&self) -> Option<Exports> {
        self.last_result
            .as_ref()
            .map(|result| self.exporter.artifacts(result))
    }
}

/// Offers whatever was produced and reports every rendition that failed.
pub fn deliver(exports: Exports, presenter: &mut dyn Presenter) {
    if !exports.artifacts.is_empty() {
        if let Err(err) = presenter.offer_artifacts(&exports.artifacts) {
            error!("export failed: {err}");
            presenter.error(&err.to_string());
        }
    }
    for err in &exports.failures {
        presenter.error(&err.to_string());
    }
}
