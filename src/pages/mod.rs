//! Page shell - composes writings and site pages into full HTML documents

use anyhow::anyhow;
use std::panic::{self, AssertUnwindSafe};
use tera::Context;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::content::{
    html_escape, ContentError, DocumentStore, MarkdownRenderer, RenderedDocument, Writing,
};
use crate::icons;
use crate::templates::{
    twitter_url, AboutData, PageMeta, StackIcon, TemplateRenderer, UsesSectionData, WritingData,
    WritingSummary,
};
use crate::Folio;

/// Errors surfaced while building a page
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("rendering failed: {0}")]
    Render(#[from] anyhow::Error),
}

impl PageError {
    /// Whether the page should be answered with "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Content(e) if e.is_not_found())
    }
}

/// Everything needed to render the site's pages
pub struct Site {
    config: SiteConfig,
    store: DocumentStore,
    markdown: MarkdownRenderer,
    templates: TemplateRenderer,
}

impl Site {
    /// Create the site over a folio directory
    pub fn new(folio: &Folio) -> anyhow::Result<Self> {
        Ok(Self {
            config: folio.config.clone(),
            store: DocumentStore::open(&folio.writings_dir),
            markdown: MarkdownRenderer::with_theme(&folio.config.highlight.theme),
            templates: TemplateRenderer::new()?,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Render a markdown body, turning a renderer panic into an error
    pub fn render_body(&self, body: &str) -> Result<RenderedDocument, PageError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.markdown.render(body)))
            .map_err(|_| PageError::Render(anyhow!("markdown renderer panicked")))
    }

    fn base_context(&self, meta: PageMeta) -> Context {
        let mut context = Context::new();
        context.insert("meta", &meta);
        context.insert("site_twitter_url", &twitter_url(&self.config.twitter));
        context
    }

    /// Writings index, newest first
    pub async fn index_page(&self) -> Result<String, PageError> {
        let writings = self.store.writings().await;
        Ok(self.index_html(&writings)?)
    }

    /// Writings index over already loaded writings
    pub fn index_html(&self, writings: &[Writing]) -> anyhow::Result<String> {
        let summaries: Vec<WritingSummary> = writings.iter().map(WritingSummary::from).collect();

        let mut context = self.base_context(PageMeta::site(&self.config));
        context.insert("writings", &summaries);
        self.templates.render("index.html", &context)
    }

    /// Page of the writing named by `slug`
    pub async fn writing_page(&self, slug: &str) -> Result<String, PageError> {
        let writing = self.store.writing(slug).await?;
        self.writing_html(&writing)
    }

    /// Page of an already loaded writing
    pub fn writing_html(&self, writing: &Writing) -> Result<String, PageError> {
        let document = self.render_body(&writing.body)?;

        let mut context = self.base_context(PageMeta::for_writing(&self.config, &writing.metadata));
        context.insert(
            "writing",
            &WritingData::new(&self.config, writing, document.to_html()),
        );
        Ok(self.templates.render("writing.html", &context)?)
    }

    /// About page; `live` enables the skill rotation feed
    pub fn about_page(&self, live: bool) -> Result<String, PageError> {
        let about = &self.config.about;
        let stack = about
            .stack
            .iter()
            .filter_map(|name| {
                icons::render(name).map(|svg| StackIcon {
                    name: html_escape(name),
                    svg,
                })
            })
            .collect();

        let data = AboutData {
            name: html_escape(&about.name),
            avatar: html_escape(&about.avatar),
            skill: about
                .skills
                .first()
                .map(|s| html_escape(s))
                .unwrap_or_default(),
            intro: about
                .intro
                .iter()
                .map(|p| html_escape(p))
                .collect(),
            stack,
        };

        let meta = PageMeta::site(&self.config).with_title(&format!("About | {}", self.config.title));
        let mut context = self.base_context(meta);
        context.insert("about", &data);
        context.insert("live", &live);
        Ok(self.templates.render("about.html", &context)?)
    }

    /// Uses page
    pub fn uses_page(&self) -> Result<String, PageError> {
        let uses = &self.config.uses;
        let sections: Vec<UsesSectionData> =
            uses.sections.iter().map(UsesSectionData::from).collect();

        let meta = PageMeta::site(&self.config)
            .with_title(&format!("Uses | {}", self.config.title))
            .with_og(Some(&uses.description), Some(&uses.image));
        let mut context = self.base_context(meta);
        context.insert("sections", &sections);
        Ok(self.templates.render("uses.html", &context)?)
    }

    /// Error page; falls back to plain text if the template itself fails
    pub fn error_page(&self, status: u16, message: &str) -> String {
        let mut context = self.base_context(PageMeta::site(&self.config));
        context.insert("status", &status);
        context.insert("message", &html_escape(message));

        match self.templates.render("error.html", &context) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                format!("{} {}", status, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = r#"---
title: Hello & welcome
author:
  name: Timothy Curchod
  twitter: timofey
og:
  description: A first post
  image: https://example.com/og/hello.png
date: 2020-05-01
---
# Hi

See [the docs](https://example.com/docs) and [a draft](other-post).

```js
const a = 1;
```
"#;

    fn site() -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        let writings = dir.path().join("writings");
        fs::create_dir_all(&writings).unwrap();
        fs::write(writings.join("hello.md"), DOC).unwrap();
        fs::write(writings.join("broken.md"), "# no front matter\n").unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        let site = Site::new(&folio).unwrap();
        (dir, site)
    }

    #[tokio::test]
    async fn test_writing_page() {
        let (_dir, site) = site();
        let html = site.writing_page("hello").await.unwrap();

        assert!(html.contains("<title>Hello &amp; welcome</title>"));
        assert!(html.contains(r#"<meta property="og:description" content="A first post" />"#));
        assert!(html.contains(
            r#"<meta property="og:image" content="https://example.com/og/hello.png" />"#
        ));
        assert!(html.contains(r#"<meta name="twitter:site" content="@timofey" />"#));
        assert!(html.contains(r#"href="https://twitter.com/timofey" target="_blank""#));
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains(
            r#"<a href="https://example.com/docs" rel="nofollow noreferrer noopener" target="_blank">the docs</a>"#
        ));
        assert!(html.contains("other-post"));
        assert!(!html.contains("a draft"));
        assert!(html.contains("data-language=\"js\""));
        assert!(html.contains("May 1, 2020"));
    }

    #[tokio::test]
    async fn test_writing_page_has_reading_progress() {
        let (_dir, site) = site();
        let html = site.writing_page("hello").await.unwrap();
        assert!(html.contains(
            r#"<div class="writing-progress-bar" id="writing-progress-bar"></div>"#
        ));
        assert!(html.contains("getElementById('writing-progress-bar')"));
        assert!(html.contains("scrollHeight - window.innerHeight"));
        assert!(html.contains("addEventListener('scroll', update"));

        // Other pages carry no progress bar
        let about = site.about_page(false).unwrap();
        assert!(!about.contains("writing-progress"));
    }

    #[tokio::test]
    async fn test_writing_page_errors() {
        let (_dir, site) = site();

        let err = site.writing_page("missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = site.writing_page("../hello").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(
            err,
            PageError::Content(ContentError::InvalidSlug(_))
        ));

        let err = site.writing_page("broken").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            PageError::Content(ContentError::MalformedFrontMatter(_))
        ));
    }

    #[tokio::test]
    async fn test_index_page_lists_parsable_writings() {
        let (_dir, site) = site();
        let html = site.index_page().await.unwrap();
        assert!(html.contains(r#"<a href="/writings/hello">Hello &amp; welcome</a>"#));
        assert!(!html.contains("broken"));
        // Site defaults for meta tags
        assert!(html.contains(
            r#"<meta property="og:description" content="Writings about web development." />"#
        ));
    }

    #[test]
    fn test_about_page() {
        let (_dir, site) = site();
        let html = site.about_page(true).unwrap();
        assert!(html.contains("<title>About | Timothy Curchod</title>"));
        assert!(html.contains(r#"id="about-skill">Curchod</span>"#));
        assert!(html.contains(r#"data-icon="React""#));
        assert!(html.contains("/about/skills"));

        let html = site.about_page(false).unwrap();
        assert!(!html.contains("/about/skills"));
    }

    #[test]
    fn test_about_page_skips_unknown_icons() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "about:\n  stack: [React, Fortran 77]\n  skills: []\n",
        )
        .unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        let site = Site::new(&folio).unwrap();

        let html = site.about_page(false).unwrap();
        assert!(html.contains(r#"data-icon="React""#));
        assert!(!html.contains("Fortran"));
        assert!(html.contains(r#"id="about-skill"></span>"#));
    }

    #[test]
    fn test_uses_page() {
        let (_dir, site) = site();
        let html = site.uses_page().unwrap();
        assert!(html.contains(
            r#"<meta property="og:description" content="What Timothy uses on a daily basis." />"#
        ));
        assert!(html.contains(
            r#"<a href="https://prettier.io" target="_blank" rel="noopener noreferrer nofollow">Prettier</a>"#
        ));
    }

    #[test]
    fn test_error_page() {
        let (_dir, site) = site();
        let html = site.error_page(404, "Nothing at <here>");
        assert!(html.contains("<h1>404</h1>"));
        assert!(html.contains("Nothing at &lt;here&gt;"));
    }
}
