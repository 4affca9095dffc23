use serde::{Deserialize, Serialize};

/// Search grounding information attached to a response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroundingMetadata {
    /// The rendered search entry point, an opaque HTML fragment meant to
    /// be embedded verbatim.
    pub rendered_content: Option<String>,
    /// Web pages the response was grounded on.
    pub sources: Vec<GroundingSource>,
    /// Search queries the model issued.
    pub search_queries: Vec<String>,
}

impl GroundingMetadata {
    /// Returns `true` if there is nothing worth showing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rendered_content.as_deref().is_none_or(str::is_empty)
            && self.sources.is_empty()
            && self.search_queries.is_empty()
    }

    /// Merges a later metadata chunk into this one.
    ///
    /// Fields present in `other` win; list fields are extended without
    /// duplicating entries.
    pub fn merge(&mut self, other: GroundingMetadata) {
        if other.rendered_content.is_some() {
            self.rendered_content = other.rendered_content;
        }
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
        for query in other.search_queries {
            if !self.search_queries.contains(&query) {
                self.search_queries.push(query);
            }
        }
    }
}

/// A web page used for grounding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroundingSource {
    /// Title of the page, usually its domain.
    pub title: String,
    /// The (often redirecting) URI of the page.
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str) -> GroundingSource {
        GroundingSource {
            title: title.to_owned(),
            uri: format!("https://{title}"),
        }
    }

    #[test]
    fn test_merge() {
        let mut metadata = GroundingMetadata {
            rendered_content: None,
            sources: vec![source("a.com")],
            search_queries: vec!["batteries".to_owned()],
        };
        metadata.merge(GroundingMetadata {
            rendered_content: Some("<div></div>".to_owned()),
            sources: vec![source("a.com"), source("b.com")],
            search_queries: vec!["batteries".to_owned()],
        });
        assert_eq!(metadata.rendered_content.as_deref(), Some("<div></div>"));
        assert_eq!(metadata.sources, vec![source("a.com"), source("b.com")]);
        assert_eq!(metadata.search_queries.len(), 1);

        metadata.merge(GroundingMetadata::default());
        assert_eq!(metadata.rendered_content.as_deref(), Some("<div></div>"));
    }

    #[test]
    fn test_is_empty() {
        assert!(GroundingMetadata::default().is_empty());
        let metadata = GroundingMetadata {
            rendered_content: Some(String::new()),
            ..Default::default()
        };
        assert!(metadata.is_empty());
        let metadata = GroundingMetadata {
            search_queries: vec!["q".to_owned()],
            ..Default::default()
        };
        assert!(!metadata.is_empty());
    }
}
