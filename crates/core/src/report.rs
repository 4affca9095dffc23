//! Report parameters picked by the user before each generation.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Who the report is written for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Audience {
    /// High-level, strategic.
    #[default]
    Executive,
    /// Deep dive, specs.
    Technical,
    /// Simple, clear.
    GeneralPublic,
}

impl Audience {
    /// All audiences, in selector order.
    pub const ALL: [Audience; 3] =
        [Audience::Executive, Audience::Technical, Audience::GeneralPublic];

    /// The full label embedded in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Audience::Executive => "Executive (High-level, strategic)",
            Audience::Technical => "Technical (Deep dive, specs)",
            Audience::GeneralPublic => "General Public (Simple, clear)",
        }
    }

    /// The first word of the label.
    pub fn short_name(self) -> &'static str {
        let label = self.label();
        label.split(' ').next().unwrap_or(label)
    }
}

/// What the report concentrates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Focus {
    /// Market & Business.
    #[default]
    Market,
    /// Technology & Innovation.
    Technology,
    /// Competitor Analysis.
    Competitors,
}

impl Focus {
    /// All focus areas, in selector order.
    pub const ALL: [Focus; 3] =
        [Focus::Market, Focus::Technology, Focus::Competitors];

    /// The label embedded in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Focus::Market => "Market & Business",
            Focus::Technology => "Technology & Innovation",
            Focus::Competitors => "Competitor Analysis",
        }
    }
}

/// Returned when a selector value is not one of the fixed options.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown option `{0}`")]
pub struct UnknownOption(String);

impl FromStr for Audience {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "executive" => Ok(Audience::Executive),
            "technical" => Ok(Audience::Technical),
            "general" | "general-public" | "public" => {
                Ok(Audience::GeneralPublic)
            }
            _ => Err(UnknownOption(s.to_owned())),
        }
    }
}

impl FromStr for Focus {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "market" | "business" => Ok(Focus::Market),
            "technology" | "tech" | "innovation" => Ok(Focus::Technology),
            "competitors" | "competitor" => Ok(Focus::Competitors),
            _ => Err(UnknownOption(s.to_owned())),
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Display for Focus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The report parameters of a single request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReportConfig {
    /// Target audience.
    pub audience: Audience,
    /// Primary focus.
    pub focus: Focus,
}

impl ReportConfig {
    /// One-line description shown above the input.
    pub fn banner(&self) -> String {
        format!(
            "Generate a **{}** report for a **{}** audience.",
            self.focus.label(),
            self.audience.short_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        let names = Audience::ALL.map(Audience::short_name);
        assert_eq!(names, ["Executive", "Technical", "General"]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Technical".parse(), Ok(Audience::Technical));
        assert_eq!("general".parse(), Ok(Audience::GeneralPublic));
        assert_eq!("competitors".parse(), Ok(Focus::Competitors));
        let err = "everyone".parse::<Audience>().unwrap_err();
        assert_eq!(err.to_string(), "unknown option `everyone`");
        let err: Box<dyn std::error::Error> = Box::new(err);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_banner() {
        let config = ReportConfig {
            audience: Audience::GeneralPublic,
            focus: Focus::Technology,
        };
        assert_eq!(
            config.banner(),
            "Generate a **Technology & Innovation** report for a **General** \
             audience."
        );
    }
}
