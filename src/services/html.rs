//! Ordered-strategy field extraction from HTML documents.
//!
//! A [`FieldSpec`] lists CSS selectors in priority order. Extraction walks the
//! list and returns the first trimmed, non-empty value, so pages that only
//! carry a `<title>` still yield a title when Open Graph tags are missing.

use scraper::{ElementRef, Html, Selector};

/// Selector that failed to parse
#[derive(Debug, thiserror::Error)]
#[error("Invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Where a matched element's value is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Whitespace-normalized text content
    Text,
    /// Named attribute value
    Attr(&'static str),
}

#[derive(Debug, Clone)]
pub struct Strategy {
    selector: Selector,
    source: Source,
}

impl Strategy {
    pub fn new(selector: &str, source: Source) -> Result<Self, SelectorError> {
        let parsed = Selector::parse(selector).map_err(|e| SelectorError {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            selector: parsed,
            source,
        })
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self.source {
            Source::Text => clean_text(&element.text().collect::<Vec<_>>().join(" ")),
            Source::Attr(name) => element.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    fn extract(&self, document: &Html) -> Option<String> {
        document
            .select(&self.selector)
            .find_map(|element| self.read(element))
    }
}

/// One field's strategies in priority order
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    strategies: Vec<Strategy>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text-content strategy
    pub fn text(mut self, selector: &str) -> Result<Self, SelectorError> {
        self.strategies.push(Strategy::new(selector, Source::Text)?);
        Ok(self)
    }

    /// Append an attribute strategy
    pub fn attr(mut self, selector: &str, name: &'static str) -> Result<Self, SelectorError> {
        self.strategies.push(Strategy::new(selector, Source::Attr(name))?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// First non-empty value across strategies
    pub fn extract(&self, document: &Html) -> Option<String> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.extract(document))
    }
}

/// Normalize whitespace
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head>
            <title>  Plain
                Title </title>
            <meta property="og:title" content="">
            <meta name="description" content="A page about cats">
            <link rel="icon" href="/favicon.ico">
        </head>
        <body><h1>Heading</h1></body>
        </html>
    "#;

    #[test]
    fn test_first_non_empty_strategy_wins() {
        let document = Html::parse_document(PAGE);
        let title = FieldSpec::new()
            .attr("meta[property='og:title']", "content")
            .unwrap()
            .text("title")
            .unwrap()
            .text("h1")
            .unwrap();

        // og:title exists but is empty, so <title> is used
        assert_eq!(title.extract(&document).as_deref(), Some("Plain Title"));
        assert_eq!(title.len(), 3);
    }

    #[test]
    fn test_missing_everywhere_is_none() {
        let document = Html::parse_document(PAGE);
        let image = FieldSpec::new()
            .attr("meta[property='og:image']", "content")
            .unwrap()
            .attr("meta[name='twitter:image']", "content")
            .unwrap();

        assert!(image.extract(&document).is_none());
        assert!(FieldSpec::new().extract(&document).is_none());
    }

    #[test]
    fn test_attribute_source() {
        let document = Html::parse_document(PAGE);
        let description = FieldSpec::new()
            .attr("meta[name='description']", "content")
            .unwrap();
        assert_eq!(description.extract(&document).as_deref(), Some("A page about cats"));
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let err = FieldSpec::new().text("div[").unwrap_err();
        assert_eq!(err.selector, "div[");
    }
}
