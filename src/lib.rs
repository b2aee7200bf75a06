//! folio: a personal site with markdown writings
//!
//! Writings are markdown files with a YAML front-matter block, addressed by
//! their file name (the slug). The site is either served over HTTP or
//! generated to static HTML, using templates embedded in the binary.

pub mod about;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod icons;
pub mod pages;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The main Folio application
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Writings directory
    pub writings_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Static assets directory
    pub static_dir: std::path::PathBuf,
}

impl Folio {
    /// Create a new Folio instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let writings_dir = base_dir.join(&config.writings_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            writings_dir,
            public_dir,
            static_dir,
        })
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new writing
    pub fn new_writing(&self, title: &str, slug: Option<&str>) -> Result<()> {
        commands::new::create_writing(self, title, slug).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.writings_dir, dir.path().join("writings"));
        assert_eq!(folio.public_dir, dir.path().join("public"));
        assert_eq!(folio.static_dir, dir.path().join("static"));
    }

    #[test]
    fn test_new_with_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Notes\nwritings_dir: content/posts\npublic_dir: dist\n",
        )
        .unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.config.title, "Notes");
        assert_eq!(folio.writings_dir, dir.path().join("content/posts"));
        assert_eq!(folio.public_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_new_with_invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: [broken\n").unwrap();
        assert!(Folio::new(dir.path()).is_err());
    }
}
