//! A [`Presenter`] printing to the terminal.

pub mod markdown;

use std::fs;
use std::io::{self, IsTerminal, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use deep_research_core::error::{ExportError, WidgetRenderError};
use deep_research_core::export::Artifact;
use deep_research_core::present::Presenter;
use deep_research_model::GroundingSource;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::widget::extract_links;

const BAR_CHAR: &str = "▎";
const MAX_WIDGET_LINKS: usize = 8;
const PROGRESS_MESSAGE: &str = "Analyzing the internet...";

/// Prints results to stdout and problems to stderr.
///
/// Artifacts are written into the output directory when one is set, and
/// only listed otherwise.
pub struct TerminalPresenter {
    out_dir: Option<PathBuf>,
    colored: bool,
    progress_bar: Option<ProgressBar>,
}

impl TerminalPresenter {
    /// Creates a presenter saving artifacts into `out_dir`.
    pub fn new(out_dir: Option<PathBuf>) -> Self {
        Self {
            out_dir,
            colored: io::stdout().is_terminal(),
            progress_bar: None,
        }
    }

    /// Returns the directory artifacts are saved into.
    #[inline]
    pub fn out_dir(&self) -> Option<&Path> {
        self.out_dir.as_deref()
    }

    fn heading(&self, title: &str) {
        if self.colored {
            println!("\n{}{}", BAR_CHAR.bright_cyan(), title.bold());
        } else {
            println!("\n{title}");
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show_markdown(&mut self, text: &str) {
        println!("{}", markdown::render(text, self.colored));
    }

    fn show_widget(&mut self, html: &str) -> Result<(), WidgetRenderError> {
        let links = extract_links(html)?;
        self.heading("📚 Verified Sources");

        let mut stdout = io::stdout().lock();
        for link in links.iter().take(MAX_WIDGET_LINKS) {
            if self.colored {
                writeln!(stdout, "  🔎 {} {}", link.label, link.href.dimmed())?;
            } else {
                writeln!(stdout, "  🔎 {} {}", link.label, link.href)?;
            }
        }
        if links.len() > MAX_WIDGET_LINKS {
            writeln!(
                stdout,
                "  ... and {} more",
                links.len() - MAX_WIDGET_LINKS
            )?;
        }
        Ok(())
    }

    fn show_sources(&mut self, sources: &[GroundingSource]) {
        self.heading("Sources");
        for (index, source) in sources.iter().enumerate() {
            let title = if source.title.is_empty() {
                &source.uri
            } else {
                &source.title
            };
            if self.colored {
                println!("  [{}] {} {}", index + 1, title, source.uri.dimmed());
            } else {
                println!("  [{}] {} {}", index + 1, title, source.uri);
            }
        }
    }

    fn show_search_queries(&mut self, queries: &[String]) {
        let line = format!("Searched for: {}", queries.join(" · "));
        if self.colored {
            println!("  {}", line.dimmed());
        } else {
            println!("  {line}");
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{}", format!("⚠️  {message}").bright_yellow());
    }

    fn error(&mut self, message: &str) {
        eprintln!("{}", format!("❌ {message}").bright_red());
    }

    fn offer_artifacts(
        &mut self,
        artifacts: &[Artifact],
    ) -> Result<(), ExportError> {
        if artifacts.is_empty() {
            return Ok(());
        }

        let Some(out_dir) = &self.out_dir else {
            self.heading("Downloads (pass --out to save)");
            for artifact in artifacts {
                println!(
                    "  📥 {} ({}, {} bytes)",
                    artifact.file_name,
                    artifact.mime,
                    artifact.bytes.len()
                );
            }
            return Ok(());
        };

        fs::create_dir_all(out_dir).map_err(|source| ExportError::Save {
            path: out_dir.clone(),
            source,
        })?;
        self.heading("Downloads");
        for artifact in artifacts {
            let path = out_dir.join(&artifact.file_name);
            fs::write(&path, &artifact.bytes).map_err(|source| {
                ExportError::Save {
                    path: path.clone(),
                    source,
                }
            })?;
            info!("saved {} ({})", path.display(), artifact.mime);
            println!("  📥 {}", path.display());
        }
        Ok(())
    }

    fn begin_progress(&mut self) -> Box<dyn Fn(String) + Send + 'static> {
        let progress_style =
            ProgressStyle::with_template("{spinner} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style);
        progress_bar.set_message(format!("🔍 {PROGRESS_MESSAGE}"));
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        self.progress_bar = Some(progress_bar.clone());

        let received = Arc::new(AtomicUsize::new(0));
        Box::new(move |delta| {
            let count = delta.chars().count();
            let total = received.fetch_add(count, Ordering::Relaxed) + count;
            progress_bar.set_message(format!(
                "🔍 {PROGRESS_MESSAGE} ({total} chars received)"
            ));
        })
    }

    fn end_progress(&mut self) {
        // Clear the spinner before printing anything else.
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}
