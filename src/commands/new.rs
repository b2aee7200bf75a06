//! Create a new writing

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::content::{validate_slug, Author, Metadata};
use crate::Folio;

/// Scaffold `<writings_dir>/<slug>.md` and return its path
///
/// The slug defaults to the slugified title. Existing files are never
/// overwritten.
pub fn create_writing(folio: &Folio, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => s.to_string(),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from title {:?}", title);
    }
    validate_slug(&slug)?;

    fs::create_dir_all(&folio.writings_dir)?;
    let file_path = folio.writings_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let metadata = Metadata {
        title: title.to_string(),
        author: Author {
            name: folio.config.author.clone(),
            twitter: folio.config.twitter.trim_start_matches('@').to_string(),
        },
        og: None,
        date: Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
        description: None,
        extra: HashMap::new(),
    };
    let content = format!("---\n{}---\n", serde_yaml::to_string(&metadata)?);

    fs::write(&file_path, content)?;
    println!("Created: {:?}", file_path);

    Ok(file_path)
}
