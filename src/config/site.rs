//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub default_image: String,
    /// Twitter handle of the site owner, without `@`
    pub twitter: String,
    /// Avatar shown next to the author of a writing
    pub author_avatar: String,
    pub author: String,

    // Directory
    pub writings_dir: String,
    pub public_dir: String,
    pub static_dir: String,

    #[serde(default)]
    pub highlight: HighlightConfig,

    // Pages
    #[serde(default)]
    pub about: AboutConfig,
    #[serde(default)]
    pub uses: UsesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Timothy Curchod".to_string(),
            description: "Writings about web development.".to_string(),
            default_image: "https://telmo.im/og/default.png".to_string(),
            twitter: "timofey".to_string(),
            author_avatar: "https://avatars.githubusercontent.com/u/2747740?v=4".to_string(),
            author: "Timothy Curchod".to_string(),

            writings_dir: "writings".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            highlight: HighlightConfig::default(),
            about: AboutConfig::default(),
            uses: UsesConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
        }
    }
}

/// About page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutConfig {
    pub name: String,
    pub avatar: String,
    /// Intro paragraphs
    pub intro: Vec<String>,
    /// Words rotated after the name
    pub skills: Vec<String>,
    pub rotate_interval_secs: u64,
    /// Technologies shown as icons
    pub stack: Vec<String>,
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            name: "Timothy".to_string(),
            avatar: "https://images.weserv.nl/?url=https://unavatar.now.sh/twitter/timofey"
                .to_string(),
            intro: vec![
                "I'm a JavaScript developer with a focus on the front end using React and Angular."
                    .to_string(),
                "Since developer blogs quickly get out of date, this blog is devoted to updated \
                 content about real world issues from my web development job."
                    .to_string(),
            ],
            skills: vec![
                "Curchod".to_string(),
                "writes JavaScript".to_string(),
                "builds with React".to_string(),
                "ships Angular".to_string(),
            ],
            rotate_interval_secs: 3,
            stack: vec![
                "JavaScript".to_string(),
                "TypeScript".to_string(),
                "React".to_string(),
                "Angular".to_string(),
                "Node.js".to_string(),
                "Nx".to_string(),
            ],
        }
    }
}

/// Uses page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsesConfig {
    /// Open-graph description of the page
    pub description: String,
    /// Open-graph image of the page
    pub image: String,
    pub sections: Vec<UsesSection>,
}

impl Default for UsesConfig {
    fn default() -> Self {
        Self {
            description: "What Timothy uses on a daily basis.".to_string(),
            image: "https://telmo.im/og/uses.png".to_string(),
            sections: vec![UsesSection {
                title: "Software".to_string(),
                intro: "The editor of choice these days is VSCode.".to_string(),
                items: vec![
                    UsesItem {
                        name: "Prettier".to_string(),
                        description: "Formats code on save".to_string(),
                        link: Some("https://prettier.io".to_string()),
                    },
                    UsesItem {
                        name: "ESLint".to_string(),
                        description: "Catches smells before review".to_string(),
                        link: Some("https://eslint.org".to_string()),
                    },
                ],
            }],
        }
    }
}

/// A titled group on the uses page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsesSection {
    pub title: String,
    pub intro: String,
    pub items: Vec<UsesItem>,
}

/// A tool on the uses page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsesItem {
    pub name: String,
    pub description: String,
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.writings_dir, "writings");
        assert_eq!(config.highlight.theme, "base16-ocean.dark");
        assert_eq!(config.about.rotate_interval_secs, 3);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Site
twitter: someone
writings_dir: posts
about:
  name: Sam
  skills: [writes Rust, reads docs]
uses:
  sections:
    - title: Hardware
      items:
        - name: Raspberry Pi
          description: Home server
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Site");
        assert_eq!(config.twitter, "someone");
        assert_eq!(config.writings_dir, "posts");
        assert_eq!(config.public_dir, "public");
        assert_eq!(config.about.name, "Sam");
        assert_eq!(config.about.skills, vec!["writes Rust", "reads docs"]);
        assert_eq!(config.about.rotate_interval_secs, 3);
        assert_eq!(config.uses.sections[0].items[0].name, "Raspberry Pi");
        assert_eq!(config.uses.sections[0].items[0].link, None);
        assert_eq!(config.uses.description, "What Timothy uses on a daily basis.");
    }
}
