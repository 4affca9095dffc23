//! Markdown to terminal text.

use owo_colors::OwoColorize;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

const RULE: &str = "────────────────────";

/// Renders `markdown` as plain terminal text, styled when `colored` is set.
pub fn render(markdown: &str, colored: bool) -> String {
    let mut renderer = Renderer {
        out: String::new(),
        colored,
        bold: 0,
        italic: 0,
        heading: false,
        lists: Vec::new(),
        links: Vec::new(),
        code_block: false,
    };
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for event in Parser::new_ext(markdown, options) {
        renderer.handle(event);
    }

    let out = renderer.out.trim_end();
    if out.is_empty() {
        String::new()
    } else {
        format!("{out}\n")
    }
}

struct Renderer {
    out: String,
    colored: bool,
    bold: usize,
    italic: usize,
    heading: bool,
    lists: Vec<Option<u64>>,
    links: Vec<String>,
    code_block: bool,
}

impl Renderer {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_block {
                    for line in text.lines() {
                        self.out.push_str("    ");
                        self.push_styled(line);
                        self.out.push('\n');
                    }
                } else {
                    self.push_styled(&text);
                }
            }
            Event::Code(code) => {
                if self.colored {
                    self.out.push_str(&code.bright_yellow().to_string());
                } else {
                    self.out.push_str(&code);
                }
            }
            Event::SoftBreak => self.out.push(' '),
            Event::HardBreak => self.out.push('\n'),
            Event::Rule => {
                self.block_gap();
                if self.colored {
                    self.out.push_str(&RULE.dimmed().to_string());
                } else {
                    self.out.push_str(RULE);
                }
                self.out.push('\n');
            }
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked { "[x] " } else { "[ ] " });
            }
            // Raw HTML and the rest have no terminal rendition.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.block_gap();
                }
            }
            Tag::Heading { .. } => {
                self.block_gap();
                self.heading = true;
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.block_gap();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.line_break();
                let depth = self.lists.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_owned(),
                };
                self.out.push_str(&marker);
            }
            Tag::CodeBlock(kind) => {
                self.block_gap();
                if let CodeBlockKind::Fenced(lang) = kind {
                    debug!("rendering a code block ({lang:?})");
                }
                self.code_block = true;
            }
            Tag::Strong => self.bold += 1,
            Tag::Emphasis => self.italic += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.out.push('\n'),
            TagEnd::Heading(_) => {
                self.heading = false;
                self.out.push('\n');
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::Item => self.line_break(),
            TagEnd::CodeBlock => self.code_block = false,
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Link => {
                let Some(url) = self.links.pop() else {
                    return;
                };
                if url.is_empty() {
                    return;
                }
                let suffix = format!(" ({url})");
                if self.colored {
                    self.out.push_str(&suffix.dimmed().to_string());
                } else {
                    self.out.push_str(&suffix);
                }
            }
            _ => {}
        }
    }

    fn push_styled(&mut self, text: &str) {
        if !self.colored {
            self.out.push_str(text);
            return;
        }
        let mut styled = text.to_owned();
        if self.italic > 0 {
            styled = styled.italic().to_string();
        }
        if self.bold > 0 || self.heading {
            styled = styled.bold().to_string();
        }
        if self.heading {
            styled = styled.bright_cyan().to_string();
        }
        self.out.push_str(&styled);
    }

    /// Ends the current line, if one is open.
    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// Leaves one blank line before the next block.
    fn block_gap(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.line_break();
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let text =
            render("## 1. Executive Summary\n\nSome **bold** text.", false);
        assert_eq!(text, "1. Executive Summary\n\nSome bold text.\n");
    }

    #[test]
    fn test_lists() {
        let text = render("Intro\n\n- a\n- b\n  - c\n\n1. x\n2. y", false);
        assert_eq!(text, "Intro\n\n• a\n• b\n  • c\n\n1. x\n2. y\n");
    }

    #[test]
    fn test_links_and_code() {
        let text = render(
            "See [docs](https://x.io)\nand `cfg`.\n\n```rust\nlet x = 1;\n```\n\n---",
            false,
        );
        assert_eq!(
            text,
            format!("See docs (https://x.io) and cfg.\n\n    let x = 1;\n\n{RULE}\n")
        );
    }

    #[test]
    fn test_colored() {
        let text = render("**hi**", true);
        assert!(text.contains("hi"));
        assert!(text.contains('\u{1b}'));
        assert_eq!(render("   ", true), "");
    }
}
