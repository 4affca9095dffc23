//! Terminal rendition of the citation widget.
//!
//! The widget is a small HTML fragment of search chips. A terminal cannot
//! embed it, so its links are pulled out and printed instead.

use deep_research_core::error::WidgetRenderError;
use scraper::{Html, Selector};

/// A link found in the widget.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WidgetLink {
    /// Visible text of the link, whitespace collapsed.
    pub label: String,
    /// Target of the link.
    pub href: String,
}

/// Extracts the links of a widget, in document order and without
/// duplicates.
///
/// Fails if the fragment has no link to show at all.
pub fn extract_links(html: &str) -> Result<Vec<WidgetLink>, WidgetRenderError> {
    let selector = Selector::parse("a[href]")
        .map_err(|err| WidgetRenderError::Markup(format!("{err:?}")))?;
    let fragment = Html::parse_fragment(html);

    let mut links: Vec<WidgetLink> = Vec::new();
    for element in fragment.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        let label = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        let link = WidgetLink {
            label: if label.is_empty() {
                href.to_owned()
            } else {
                label
            },
            href: href.to_owned(),
        };
        if !links.contains(&link) {
            links.push(link);
        }
    }

    if links.is_empty() {
        return Err(WidgetRenderError::Markup(
            "no links in the search widget".to_owned(),
        ));
    }
    Ok(links)
}
