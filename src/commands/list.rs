//! List writings

use anyhow::Result;
use serde::Serialize;

use crate::content::{DocumentStore, Writing};
use crate::Folio;

/// One row of the listing
#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub slug: String,
    pub title: String,
    pub date: Option<String>,
    pub path: String,
}

impl From<&Writing> for ListEntry {
    fn from(writing: &Writing) -> Self {
        Self {
            slug: writing.slug.clone(),
            title: writing.metadata.title.clone(),
            date: writing.metadata.date.clone(),
            path: writing.path(),
        }
    }
}

/// Collect the listing, newest first
pub async fn entries(folio: &Folio) -> Vec<ListEntry> {
    let store = DocumentStore::open(&folio.writings_dir);
    store.writings().await.iter().map(ListEntry::from).collect()
}

/// Print the writings, as text or as JSON
pub async fn run(folio: &Folio, json: bool) -> Result<()> {
    let entries = entries(folio).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Writings ({}):", entries.len());
    for entry in entries {
        println!(
            "  {} - {} [{}]",
            entry.date.as_deref().unwrap_or("undated"),
            entry.title,
            entry.slug
        );
    }

    Ok(())
}
