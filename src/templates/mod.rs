//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded in the binary. Autoescaping is off: every
//! string placed in a context is escaped when the data is built, and
//! rendered markdown and icon SVG go in as-is.

use anyhow::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{SiteConfig, UsesSection};
use crate::content::{html_escape, Metadata, Writing};

/// Characters kept as-is in a twitter handle
const HANDLE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_');

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("writing.html", include_str!("site/writing.html")),
            ("about.html", include_str!("site/about.html")),
            ("uses.html", include_str!("site/uses.html")),
            ("error.html", include_str!("site/error.html")),
            (
                "partials/head.html",
                include_str!("site/partials/head.html"),
            ),
            ("partials/nav.html", include_str!("site/partials/nav.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: format a `YYYY-MM-DD...` date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    let day = s.get(..10).unwrap_or(&s);
    if let Ok(date) = chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        let formatted = match format.as_str() {
            "LL" => date.format("%B %-d, %Y").to_string(),
            _ => date.format("%Y-%m-%d").to_string(),
        };
        return Ok(tera::Value::String(formatted));
    }

    // Unparseable dates are shown as written
    Ok(tera::Value::String(s))
}

/// Twitter profile URL of a handle
pub fn twitter_url(handle: &str) -> String {
    let handle = handle.trim_start_matches('@');
    format!(
        "https://twitter.com/{}",
        utf8_percent_encode(handle, HANDLE)
    )
}

// Data structures for template context

/// Social meta tags and `<title>`
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub site_name: String,
    pub description: String,
    pub image: String,
    pub twitter: String,
}

impl PageMeta {
    /// Site-wide defaults
    pub fn site(config: &SiteConfig) -> Self {
        Self {
            title: html_escape(&config.title),
            site_name: html_escape(&config.title),
            description: html_escape(&config.description),
            image: html_escape(&config.default_image),
            twitter: html_escape(config.twitter.trim_start_matches('@')),
        }
    }

    /// Page-specific title, falling back to the site title when empty
    pub fn with_title(mut self, title: &str) -> Self {
        if !title.trim().is_empty() {
            self.title = html_escape(title);
        }
        self
    }

    /// Page-specific open-graph fields
    pub fn with_og(mut self, description: Option<&str>, image: Option<&str>) -> Self {
        if let Some(description) = description {
            self.description = html_escape(description);
        }
        if let Some(image) = image {
            self.image = html_escape(image);
        }
        self
    }

    /// Meta tags of a writing
    pub fn for_writing(config: &SiteConfig, metadata: &Metadata) -> Self {
        Self::site(config)
            .with_title(&metadata.title)
            .with_og(metadata.og_description(), metadata.og_image())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorData {
    pub name: String,
    pub twitter: String,
    pub profile_url: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WritingData {
    pub slug: String,
    pub title: String,
    pub date: Option<String>,
    pub author: AuthorData,
    /// Rendered markdown body
    pub content: String,
}

impl WritingData {
    pub fn new(config: &SiteConfig, writing: &Writing, content: String) -> Self {
        let author = &writing.metadata.author;
        Self {
            slug: html_escape(&writing.slug),
            title: html_escape(&writing.metadata.title),
            date: writing.metadata.date.as_deref().map(html_escape),
            author: AuthorData {
                name: html_escape(&author.name),
                twitter: html_escape(&author.twitter),
                profile_url: html_escape(&twitter_url(&author.twitter)),
                avatar: html_escape(&config.author_avatar),
            },
            content,
        }
    }
}

/// Entry of the writings index
#[derive(Debug, Clone, Serialize)]
pub struct WritingSummary {
    pub title: String,
    pub path: String,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl From<&Writing> for WritingSummary {
    fn from(writing: &Writing) -> Self {
        Self {
            title: html_escape(&writing.metadata.title),
            path: html_escape(&writing.path()),
            date: writing.metadata.date.as_deref().map(html_escape),
            description: writing.metadata.description.as_deref().map(html_escape),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutData {
    pub name: String,
    pub avatar: String,
    /// Skill shown before the rotation starts
    pub skill: String,
    pub intro: Vec<String>,
    pub stack: Vec<StackIcon>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackIcon {
    pub name: String,
    pub svg: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsesSectionData {
    pub title: String,
    pub intro: String,
    pub items: Vec<UsesItemData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsesItemData {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
}

impl From<&UsesSection> for UsesSectionData {
    fn from(section: &UsesSection) -> Self {
        Self {
            title: html_escape(&section.title),
            intro: html_escape(&section.intro),
            items: section
                .items
                .iter()
                .map(|item| UsesItemData {
                    name: html_escape(&item.name),
                    description: html_escape(&item.description),
                    link: item.link.as_deref().map(html_escape),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(value: &str, format: Option<&str>) -> String {
        let mut args = HashMap::new();
        if let Some(format) = format {
            args.insert("format".to_string(), tera::Value::String(format.to_string()));
        }
        match date_format_filter(&tera::Value::String(value.to_string()), &args).unwrap() {
            tera::Value::String(s) => s,
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_templates_load() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_date_format_filter() {
        assert_eq!(filter("2020-03-04", Some("LL")), "March 4, 2020");
        assert_eq!(filter("2020-03-04 10:00:00", None), "2020-03-04");
        assert_eq!(filter("someday", Some("LL")), "someday");
    }

    #[test]
    fn test_twitter_url() {
        assert_eq!(twitter_url("timofey"), "https://twitter.com/timofey");
        assert_eq!(twitter_url("@some_one"), "https://twitter.com/some_one");
        assert_eq!(twitter_url("a/../b"), "https://twitter.com/a%2F%2E%2E%2Fb");
    }

    #[test]
    fn test_page_meta_fallbacks() {
        let config = SiteConfig::default();
        let meta = PageMeta::site(&config).with_title("  ").with_og(None, None);
        assert_eq!(meta.title, "Timothy Curchod");
        assert_eq!(meta.description, "Writings about web development.");
        assert_eq!(meta.image, "https://telmo.im/og/default.png");

        let meta = PageMeta::site(&config)
            .with_title("Tabs & spaces")
            .with_og(Some("A <short> story"), Some("https://example.com/og.png"));
        assert_eq!(meta.title, "Tabs &amp; spaces");
        assert_eq!(meta.site_name, "Timothy Curchod");
        assert_eq!(meta.description, "A &lt;short&gt; story");
        assert_eq!(meta.image, "https://example.com/og.png");
    }
}
