#![cfg(feature = "cli")]

use std::fs;

use deep_research::core::export::MarkdownPdfExport;
use deep_research::core::present::WidgetStatus;
use deep_research::core::prompt::Mode;
use deep_research::core::{ActionOutcome, SessionBuilder};
use deep_research::terminal::TerminalPresenter;
use deep_research_test_model::{PresetResponse, TestModelProvider};

#[tokio::test]
async fn test_briefing_is_saved() {
    let provider = TestModelProvider::default();
    provider.add_response(
        PresetResponse::with_text("## 1. Executive Summary\n\nAll good.")
            .with_widget(
                "<a class=\"chip\" href=\"https://google.com/search?q=x\">x</a>",
            ),
    );
    let mut session = SessionBuilder::with_model_provider(provider)
        .with_mode(Mode::Analyst)
        .with_exporter(MarkdownPdfExport::default())
        .build();

    let dir = tempfile::tempdir().unwrap();
    // Not created yet, the presenter has to create it.
    let out_dir = dir.path().join("exports");
    let mut presenter = TerminalPresenter::new(Some(out_dir.clone()));
    let outcome = session.handle_query("Topic", &mut presenter).await;
    assert_eq!(outcome, ActionOutcome::Rendered(WidgetStatus::Rendered));

    let markdown = fs::read_to_string(out_dir.join("briefing.md")).unwrap();
    assert_eq!(markdown, "## 1. Executive Summary\n\nAll good.");
    let pdf = fs::read(out_dir.join("briefing.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    let page = fs::read_to_string(out_dir.join("sources.html")).unwrap();
    assert!(page.contains("search?q=x"));
}

#[tokio::test]
async fn test_unusable_widget_is_skipped() {
    let provider = TestModelProvider::default();
    provider.add_response(
        PresetResponse::with_text("Text").with_widget("<div>no chips</div>"),
    );
    let mut session =
        SessionBuilder::with_model_provider(provider).build();

    let mut presenter = TerminalPresenter::new(None);
    let outcome = session.handle_query("Why?", &mut presenter).await;
    assert_eq!(outcome, ActionOutcome::Rendered(WidgetStatus::Failed));
    assert_eq!(session.history().len(), 2);
}
