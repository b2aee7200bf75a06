//! Writing model

use serde::Serialize;

use super::{ContentError, MarkdownRenderer, Metadata, RenderedDocument};

/// A parsed writing: front-matter metadata plus the markdown body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Writing {
    /// Slug (file name without the `.md` extension)
    pub slug: String,

    /// Front-matter metadata
    pub metadata: Metadata,

    /// Markdown text after the front matter
    pub body: String,
}

impl Writing {
    /// Split a raw document into a writing
    pub fn parse(slug: &str, raw: &str) -> Result<Self, ContentError> {
        let (metadata, body) = Metadata::parse(raw)?;
        Ok(Self {
            slug: slug.to_string(),
            metadata,
            body: body.to_string(),
        })
    }

    /// Render the markdown body
    pub fn render(&self, renderer: &MarkdownRenderer) -> RenderedDocument {
        renderer.render(&self.body)
    }

    /// URL path of the writing page
    pub fn path(&self) -> String {
        format!("/writings/{}", self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_writing() {
        let raw = "---\ntitle: Hello\nauthor:\n  name: T\n  twitter: t\n---\n# Hi\n";
        let writing = Writing::parse("hello", raw).unwrap();
        assert_eq!(writing.slug, "hello");
        assert_eq!(writing.metadata.title, "Hello");
        assert_eq!(writing.body, "# Hi\n");
        assert_eq!(writing.path(), "/writings/hello");

        let html = writing.render(&MarkdownRenderer::new()).to_html();
        assert!(html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_parse_writing_without_front_matter() {
        let err = Writing::parse("bare", "# Hi\n").unwrap_err();
        assert!(matches!(err, ContentError::MalformedFrontMatter(_)));
    }
}
