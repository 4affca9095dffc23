//! Turns the user's selections and query into what is sent to the model.

use deep_research_model::ModelRequest;

use crate::conversation::Turn;
use crate::report::ReportConfig;

/// What kind of pipeline a session runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A single-shot report steered by audience and focus.
    Report(ReportConfig),
    /// A single-shot mini-briefing with a fixed analyst persona.
    Analyst,
    /// A multi-turn conversation with memory.
    Chat,
}

impl Mode {
    /// Returns `true` if turns are recorded and fed back.
    #[inline]
    pub fn keeps_history(&self) -> bool {
        matches!(self, Mode::Chat)
    }

    /// The file name used for the markdown export.
    pub fn markdown_file_name(&self) -> &'static str {
        match self {
            Mode::Report(_) => "research_report.md",
            Mode::Analyst => "briefing.md",
            Mode::Chat => "report.md",
        }
    }
}

const ANALYST_INSTRUCTION: &str = "\
You are a High-Level Tech Analyst.
When asked a topic, do not just answer the question.
Write a mini-briefing (Markdown format) with these headers:
## 1. Executive Summary (The bottom line)
## 2. Key Details (Bulleted list of facts)
## 3. Market/Strategic Implications (Why this matters)

Keep it concise but insightful. ALWAYS use the search tool to get current data.";

const FOLLOW_UP_INSTRUCTION: &str = "\
Use the conversation history above to understand follow-up questions \
such as \"why?\" or \"tell me more\". ALWAYS use the search tool to get \
current data for the new question.";

/// A prompt ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComposedPrompt {
    /// Steering instruction, absent in chat mode.
    pub system_instruction: Option<String>,
    /// The user content.
    pub content: String,
}

impl From<ComposedPrompt> for ModelRequest {
    #[inline]
    fn from(prompt: ComposedPrompt) -> Self {
        ModelRequest {
            system_instruction: prompt.system_instruction,
            content: prompt.content,
        }
    }
}

/// Builds the prompt for `query`.
///
/// `history` is only read in chat mode, and the caller is expected to pass
/// the window it wants the model to see.
pub fn compose(mode: &Mode, history: &[Turn], query: &str) -> ComposedPrompt {
    match mode {
        Mode::Report(config) => ComposedPrompt {
            system_instruction: Some(report_instruction(config)),
            content: query.to_owned(),
        },
        Mode::Analyst => ComposedPrompt {
            system_instruction: Some(ANALYST_INSTRUCTION.to_owned()),
            content: query.to_owned(),
        },
        Mode::Chat => ComposedPrompt {
            system_instruction: None,
            content: chat_content(history, query),
        },
    }
}

/// The system instruction of a configured report.
pub fn report_instruction(config: &ReportConfig) -> String {
    let audience = config.audience.label();
    let focus = config.focus.label();
    format!(
        "You are a premier AI Research Analyst.
Your Target Audience is: {audience}.
Your Primary Focus is: {focus}.

Structure the report in Markdown:
## 1. Executive Summary
## 2. Deep Dive Analysis (Focus on {focus})
## 3. Strategic Implications
## 4. Sources & Credibility

Be professional, data-driven, and concise."
    )
}

/// Renders `history` as `role: content` lines.
pub fn serialize_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn chat_content(history: &[Turn], query: &str) -> String {
    format!(
        "Conversation history:\n{}\n\nNew question: {query}\n\n\
         {FOLLOW_UP_INSTRUCTION}",
        serialize_history(history)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Audience, Focus};

    #[test]
    fn test_report_instruction_embeds_labels() {
        for audience in Audience::ALL {
            for focus in Focus::ALL {
                let mode = Mode::Report(ReportConfig { audience, focus });
                let prompt = compose(&mode, &[], "solid state batteries");
                let instruction = prompt.system_instruction.unwrap();
                assert!(instruction.contains(audience.label()));
                assert!(instruction.contains(focus.label()));
                assert!(instruction.contains(&format!(
                    "## 2. Deep Dive Analysis (Focus on {})",
                    focus.label()
                )));
                assert_eq!(prompt.content, "solid state batteries");
            }
        }
    }

    #[test]
    fn test_analyst_prompt() {
        let prompt = compose(&Mode::Analyst, &[], "Nvidia Blackwell");
        let instruction = prompt.system_instruction.unwrap();
        assert!(instruction.starts_with("You are a High-Level Tech Analyst."));
        assert!(instruction.contains("## 3. Market/Strategic Implications"));
        assert_eq!(prompt.content, "Nvidia Blackwell");
    }

    #[test]
    fn test_chat_prompt_with_history() {
        let history = [
            Turn::user("Tell me about X"),
            Turn::assistant("X is a thing."),
        ];
        let prompt = compose(&Mode::Chat, &history, "Why?");
        assert_eq!(prompt.system_instruction, None);
        assert!(prompt.content.contains(
            "Conversation history:\nuser: Tell me about X\nassistant: X is a \
             thing.\n\nNew question: Why?"
        ));
        assert!(prompt.content.ends_with(FOLLOW_UP_INSTRUCTION));
    }

    #[test]
    fn test_chat_prompt_without_history() {
        let prompt = compose(&Mode::Chat, &[], "Hello");
        assert!(
            prompt
                .content
                .starts_with("Conversation history:\n\n\nNew question: Hello")
        );
        assert_eq!(serialize_history(&[]), "");
    }
}
