use reqwest::Url;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::services::html::{FieldSpec, SelectorError};
use crate::services::http::HttpClient;

/// Selector strategies for each preview field
struct PreviewFields {
    title: FieldSpec,
    description: FieldSpec,
    image: FieldSpec,
    site_name: FieldSpec,
    favicon: FieldSpec,
}

impl PreviewFields {
    fn new() -> std::result::Result<Self, SelectorError> {
        Ok(Self {
            title: FieldSpec::new()
                .attr("meta[property='og:title']", "content")?
                .attr("meta[name='twitter:title']", "content")?
                .text("title")?
                .text("h1")?,
            description: FieldSpec::new()
                .attr("meta[property='og:description']", "content")?
                .attr("meta[name='twitter:description']", "content")?
                .attr("meta[name='description']", "content")?,
            image: FieldSpec::new()
                .attr("meta[property='og:image']", "content")?
                .attr("meta[property='og:image:url']", "content")?
                .attr("meta[name='twitter:image']", "content")?
                .attr("link[rel='image_src']", "href")?,
            site_name: FieldSpec::new()
                .attr("meta[property='og:site_name']", "content")?
                .attr("meta[name='application-name']", "content")?,
            favicon: FieldSpec::new()
                .attr("link[rel='icon']", "href")?
                .attr("link[rel='shortcut icon']", "href")?
                .attr("link[rel='apple-touch-icon']", "href")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
    pub favicon: Option<String>,
}

/// Title, description and image of a web page
pub struct LinkPreviews {
    client: HttpClient,
    fields: PreviewFields,
}

impl LinkPreviews {
    pub fn new(client: HttpClient) -> std::result::Result<Self, SelectorError> {
        Ok(Self {
            client,
            fields: PreviewFields::new()?,
        })
    }

    pub async fn preview(&self, url: &str) -> Result<LinkPreview> {
        let page = Url::parse(url).map_err(|e| GatewayError::validation(format!("Invalid URL: {e}")))?;
        if !matches!(page.scheme(), "http" | "https") {
            return Err(GatewayError::validation("URL must start with http:// or https://"));
        }

        let fetched = self.client.get_bytes(page.as_str()).await?;
        if let Some(content_type) = &fetched.content_type
            && !content_type.contains("html")
        {
            return Err(GatewayError::validation(format!(
                "URL does not point to an HTML page ({content_type})"
            )));
        }

        let html = String::from_utf8_lossy(&fetched.bytes);
        Ok(self.extract(&page, &html))
    }

    /// Pull preview fields out of a fetched document
    pub fn extract(&self, page: &Url, html: &str) -> LinkPreview {
        let document = Html::parse_document(html);
        let absolute = |value: String| page.join(&value).map_or(value, |u| u.to_string());

        LinkPreview {
            url: page.to_string(),
            title: self.fields.title.extract(&document),
            description: self.fields.description.extract(&document),
            image: self.fields.image.extract(&document).map(absolute),
            site_name: self
                .fields
                .site_name
                .extract(&document)
                .or_else(|| page.host_str().map(ToString::to_string)),
            favicon: Some(
                self.fields
                    .favicon
                    .extract(&document)
                    .map_or_else(|| absolute("/favicon.ico".to_string()), absolute),
            ),
        }
    }
}
