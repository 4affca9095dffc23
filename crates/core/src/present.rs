//! The output surface of the pipeline.

use deep_research_model::GroundingSource;

use crate::error::{ExportError, WidgetRenderError};
use crate::export::Artifact;
use crate::model_client::GenerationResult;

/// Where results, warnings and downloads are shown.
pub trait Presenter {
    /// Shows the response text, formatted as markdown.
    fn show_markdown(&mut self, text: &str);

    /// Embeds the citation widget.
    fn show_widget(&mut self, html: &str) -> Result<(), WidgetRenderError>;

    /// Lists the pages the response was grounded on.
    fn show_sources(&mut self, sources: &[GroundingSource]) {
        let _ = sources;
    }

    /// Lists the web searches the answer is based on.
    fn show_search_queries(&mut self, queries: &[String]) {
        let _ = queries;
    }

    /// Shows a recoverable problem with the user's input.
    fn warn(&mut self, message: &str);

    /// Shows a failed action.
    fn error(&mut self, message: &str);

    /// Offers the exports of the latest result.
    fn offer_artifacts(
        &mut self,
        artifacts: &[Artifact],
    ) -> Result<(), ExportError>;

    /// Called right before a generation request, the returned callback
    /// receives streamed text.
    fn begin_progress(&mut self) -> Box<dyn Fn(String) + Send + 'static> {
        Box::new(|_| {})
    }

    /// Called when the generation request has finished either way.
    fn end_progress(&mut self) {}
}

/// What happened to the citation widget during [`render`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetStatus {
    /// The response carried no widget.
    Absent,
    /// The widget was embedded.
    Rendered,
    /// The widget was there but could not be embedded.
    Failed,
}

/// Shows `result` on `presenter`.
///
/// The widget is best-effort: a failure to embed it is logged and never
/// affects the text, which has been shown already.
pub fn render(
    result: &GenerationResult,
    presenter: &mut dyn Presenter,
) -> WidgetStatus {
    presenter.show_markdown(&result.text);

    let status = match result.widget_html() {
        None => WidgetStatus::Absent,
        Some(html) => match presenter.show_widget(html) {
            Ok(()) => WidgetStatus::Rendered,
            Err(err) => {
                warn!("failed to render the citation widget: {err}");
                WidgetStatus::Failed
            }
        },
    };

    if !result.sources.is_empty() {
        presenter.show_sources(&result.sources);
    }
    if !result.search_queries.is_empty() {
        presenter.show_search_queries(&result.search_queries);
    }
    status
}
