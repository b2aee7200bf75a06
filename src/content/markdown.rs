//! Markdown rendering with syntax highlighting
//!
//! Markdown is parsed into a [`RenderedDocument`] tree rather than straight
//! into HTML so the two presentation rules (code blocks and links) are
//! applied to typed nodes. The tree serializes to HTML with
//! [`RenderedDocument::to_html`].

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use std::fmt::Write;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// `rel` attribute carried by every external anchor
pub const EXTERNAL_REL: &str = "nofollow noreferrer noopener";

/// `target` attribute carried by every external anchor
pub const EXTERNAL_TARGET: &str = "_blank";

/// Rendered markdown document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedDocument {
    pub children: Vec<Node>,
}

/// A block or inline node of a rendered document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Paragraph(Vec<Node>),
    Heading { level: u8, children: Vec<Node> },
    BlockQuote(Vec<Node>),
    /// `start` is set for ordered lists
    List { start: Option<u64>, items: Vec<Node> },
    Item(Vec<Node>),
    CodeBlock(CodeBlock),
    /// Inline code span, shown as monospace text
    InlineCode(String),
    Emphasis(Vec<Node>),
    Strong(Vec<Node>),
    Link(Anchor),
    Image {
        src: String,
        alt: String,
        title: String,
    },
    Text(String),
    /// Raw HTML from the source, emitted unescaped
    Html(String),
    SoftBreak,
    HardBreak,
    Rule,
}

/// A fenced or indented code block
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Language tag of a fenced block
    pub language: Option<String>,
    /// Literal code text
    pub code: String,
    pub presentation: CodePresentation,
}

/// How a code block is presented
#[derive(Debug, Clone, PartialEq)]
pub enum CodePresentation {
    /// Syntax-highlighted HTML for a recognized language
    Highlighted(String),
    /// Unstyled monospace text
    Plain,
}

/// An external hyperlink opened in a new browsing context
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub href: String,
    pub title: String,
    pub target: &'static str,
    pub rel: &'static str,
    pub children: Vec<Node>,
}

/// Whether a link target is absolute and should open as an external anchor
pub fn is_external(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_theme("base16-ocean.dark")
    }

    /// Create with a specific highlight theme
    pub fn with_theme(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    /// Render markdown into a document tree
    pub fn render(&self, markdown: &str) -> RenderedDocument {
        let parser = Parser::new_ext(markdown, Options::empty());

        let mut stack: Vec<Frame> = vec![Frame::new(FrameKind::Root)];

        for event in parser {
            match event {
                Event::Start(tag) => stack.push(Frame::new(self.frame_kind(tag))),
                Event::End(_) => {
                    // Every End matches the most recent Start
                    if stack.len() > 1 {
                        if let Some(frame) = stack.pop() {
                            let nodes = self.finish(frame);
                            push_all(&mut stack, nodes);
                        }
                    }
                }
                Event::Text(text) => push(&mut stack, Node::Text(text.into_string())),
                Event::Code(code) => push(&mut stack, Node::InlineCode(code.into_string())),
                Event::Html(html) | Event::InlineHtml(html) => {
                    push(&mut stack, Node::Html(html.into_string()))
                }
                Event::SoftBreak => push(&mut stack, Node::SoftBreak),
                Event::HardBreak => push(&mut stack, Node::HardBreak),
                Event::Rule => push(&mut stack, Node::Rule),
                _ => {}
            }
        }

        // Close anything the parser left open
        while stack.len() > 1 {
            if let Some(frame) = stack.pop() {
                let nodes = self.finish(frame);
                push_all(&mut stack, nodes);
            }
        }

        let children = stack.pop().map(|root| root.children).unwrap_or_default();
        RenderedDocument { children }
    }

    fn frame_kind(&self, tag: Tag<'_>) -> FrameKind {
        match tag {
            Tag::Paragraph => FrameKind::Paragraph,
            Tag::Heading { level, .. } => FrameKind::Heading(level as u8),
            Tag::BlockQuote(..) => FrameKind::BlockQuote,
            Tag::CodeBlock(kind) => FrameKind::CodeBlock(match kind {
                CodeBlockKind::Fenced(info) => info
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .next()
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string),
                CodeBlockKind::Indented => None,
            }),
            Tag::List(start) => FrameKind::List(start),
            Tag::Item => FrameKind::Item,
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            Tag::Link {
                dest_url, title, ..
            } => FrameKind::Link {
                href: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => FrameKind::Image {
                src: dest_url.into_string(),
                title: title.into_string(),
            },
            _ => FrameKind::Transparent,
        }
    }

    fn finish(&self, frame: Frame) -> Vec<Node> {
        let children = frame.children;
        let node = match frame.kind {
            FrameKind::Root | FrameKind::Transparent => return children,
            FrameKind::Paragraph => Node::Paragraph(children),
            FrameKind::Heading(level) => Node::Heading { level, children },
            FrameKind::BlockQuote => Node::BlockQuote(children),
            FrameKind::List(start) => Node::List {
                start,
                items: children,
            },
            FrameKind::Item => Node::Item(children),
            FrameKind::Emphasis => Node::Emphasis(children),
            FrameKind::Strong => Node::Strong(children),
            FrameKind::CodeBlock(language) => {
                Node::CodeBlock(self.code_block(language, plain_text(&children)))
            }
            FrameKind::Link { href, title } => {
                if is_external(&href) {
                    Node::Link(Anchor {
                        href,
                        title,
                        target: EXTERNAL_TARGET,
                        rel: EXTERNAL_REL,
                        children,
                    })
                } else {
                    // Internal links have no route yet, show the target itself
                    Node::Text(href)
                }
            }
            FrameKind::Image { src, title } => Node::Image {
                src,
                alt: plain_text(&children),
                title,
            },
        };
        vec![node]
    }

    fn code_block(&self, language: Option<String>, code: String) -> CodeBlock {
        let presentation = match language.as_deref() {
            Some(lang) => self
                .highlight_code(&code, &lang.to_ascii_lowercase())
                .map(CodePresentation::Highlighted)
                .unwrap_or(CodePresentation::Plain),
            None => CodePresentation::Plain,
        };

        CodeBlock {
            language,
            code,
            presentation,
        }
    }

    /// Highlight code for a known language, `None` when the language is unknown
    fn highlight_code(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))?;

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())?;

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => Some(highlighted),
            Err(e) => {
                tracing::warn!("Failed to highlight {} code block: {}", lang, e);
                None
            }
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

enum FrameKind {
    Root,
    /// Container whose children are spliced into the parent
    Transparent,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Emphasis,
    Strong,
    Link { href: String, title: String },
    Image { src: String, title: String },
}

struct Frame {
    kind: FrameKind,
    children: Vec<Node>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

fn push(stack: &mut [Frame], node: Node) {
    if let Some(frame) = stack.last_mut() {
        frame.children.push(node);
    }
}

fn push_all(stack: &mut [Frame], nodes: Vec<Node>) {
    if let Some(frame) = stack.last_mut() {
        frame.children.extend(nodes);
    }
}

/// Concatenated text content of a node list
fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) | Node::InlineCode(text) | Node::Html(text) => out.push_str(text),
            Node::SoftBreak | Node::HardBreak => out.push('\n'),
            Node::Paragraph(children)
            | Node::BlockQuote(children)
            | Node::Item(children)
            | Node::Emphasis(children)
            | Node::Strong(children)
            | Node::Heading { children, .. }
            | Node::List {
                items: children, ..
            } => collect_text(children, out),
            Node::Link(anchor) => collect_text(&anchor.children, out),
            Node::CodeBlock(block) => out.push_str(&block.code),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::Rule => {}
        }
    }
}

impl RenderedDocument {
    /// Serialize the tree to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&mut out, &self.children);
        out
    }
}

fn write_nodes(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &Node) {
    // Writing into a String cannot fail
    let _ = match node {
        Node::Paragraph(children) => wrap(out, "p", children),
        Node::Heading { level, children } => {
            let tag = format!("h{}", level);
            wrap(out, &tag, children)
        }
        Node::BlockQuote(children) => wrap(out, "blockquote", children),
        Node::List {
            start: Some(start),
            items,
        } => {
            if *start == 1 {
                out.push_str("<ol>\n");
            } else {
                let _ = write!(out, "<ol start=\"{}\">\n", start);
            }
            write_nodes(out, items);
            out.push_str("</ol>\n");
            Ok(())
        }
        Node::List { start: None, items } => {
            out.push_str("<ul>\n");
            write_nodes(out, items);
            out.push_str("</ul>\n");
            Ok(())
        }
        Node::Item(children) => {
            out.push_str("<li>");
            write_nodes(out, children);
            out.push_str("</li>\n");
            Ok(())
        }
        Node::CodeBlock(block) => {
            write_code_block(out, block);
            Ok(())
        }
        Node::InlineCode(code) => write!(out, "<code>{}</code>", html_escape(code)),
        Node::Emphasis(children) => wrap_inline(out, "em", children),
        Node::Strong(children) => wrap_inline(out, "strong", children),
        Node::Link(anchor) => {
            let _ = write!(out, "<a href=\"{}\"", html_escape(&anchor.href));
            if !anchor.title.is_empty() {
                let _ = write!(out, " title=\"{}\"", html_escape(&anchor.title));
            }
            let _ = write!(
                out,
                " rel=\"{}\" target=\"{}\">",
                anchor.rel, anchor.target
            );
            write_nodes(out, &anchor.children);
            out.push_str("</a>");
            Ok(())
        }
        Node::Image { src, alt, title } => {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"{}\"",
                html_escape(src),
                html_escape(alt)
            );
            if !title.is_empty() {
                let _ = write!(out, " title=\"{}\"", html_escape(title));
            }
            out.push_str(" />");
            Ok(())
        }
        Node::Text(text) => {
            out.push_str(&html_escape(text));
            Ok(())
        }
        Node::Html(html) => {
            out.push_str(html);
            Ok(())
        }
        Node::SoftBreak => {
            out.push('\n');
            Ok(())
        }
        Node::HardBreak => {
            out.push_str("<br />\n");
            Ok(())
        }
        Node::Rule => {
            out.push_str("<hr />\n");
            Ok(())
        }
    };
}

fn wrap(out: &mut String, tag: &str, children: &[Node]) -> std::fmt::Result {
    write!(out, "<{}>", tag)?;
    write_nodes(out, children);
    write!(out, "</{}>\n", tag)
}

fn wrap_inline(out: &mut String, tag: &str, children: &[Node]) -> std::fmt::Result {
    write!(out, "<{}>", tag)?;
    write_nodes(out, children);
    write!(out, "</{}>", tag)
}

fn write_code_block(out: &mut String, block: &CodeBlock) {
    match (&block.presentation, block.language.as_deref()) {
        (CodePresentation::Highlighted(html), Some(lang)) => {
            let _ = write!(
                out,
                "<div class=\"code-block highlight\" data-language=\"{}\">{}</div>\n",
                html_escape(&lang.to_ascii_lowercase()),
                html
            );
        }
        (CodePresentation::Highlighted(html), None) => {
            let _ = write!(out, "<div class=\"code-block highlight\">{}</div>\n", html);
        }
        (CodePresentation::Plain, _) => {
            let _ = write!(
                out,
                "<pre class=\"code-block\"><code>{}</code></pre>\n",
                html_escape(&block.code)
            );
        }
    }
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
