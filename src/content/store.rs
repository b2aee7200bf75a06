//! Document store - the writings directory addressed by slug

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use walkdir::WalkDir;

use super::{ContentError, Writing};

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

/// Check that a slug is a plain identifier that cannot leave the store root
pub fn validate_slug(slug: &str) -> Result<(), ContentError> {
    if slug.contains("..") || !SLUG_RE.is_match(slug) {
        return Err(ContentError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Read-only collection of `<slug>.md` files
///
/// The set of known slugs is indexed when the store is opened, so a slug
/// only ever resolves to a path the index already holds.
pub struct DocumentStore {
    root: PathBuf,
    index: RwLock<BTreeMap<String, PathBuf>>,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl DocumentStore {
    /// Open a store over a directory and index its markdown files
    pub fn open<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let index = scan(&root);
        tracing::debug!("Indexed {} writings in {:?}", index.len(), root);

        Self {
            root,
            index: RwLock::new(index),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Re-index the directory and drop cached content
    pub fn refresh(&self) {
        let index = scan(&self.root);
        tracing::info!("Re-indexed {} writings", index.len());

        if let Ok(mut guard) = self.index.write() {
            *guard = index;
        }
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// All known slugs, sorted
    pub fn slugs(&self) -> Vec<String> {
        self.index
            .read()
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a slug names a writing in the store
    pub fn contains(&self, slug: &str) -> bool {
        self.index
            .read()
            .map(|index| index.contains_key(slug))
            .unwrap_or(false)
    }

    /// Load the raw text of the writing named by `slug`
    pub async fn load(&self, slug: &str) -> Result<Arc<str>, ContentError> {
        validate_slug(slug)?;

        if let Some(hit) = self.cache.read().ok().and_then(|c| c.get(slug).cloned()) {
            return Ok(hit);
        }

        let path = self
            .index
            .read()
            .ok()
            .and_then(|index| index.get(slug).cloned())
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))?;

        let raw: Arc<str> = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw.into(),
            // Deleted since the last index
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContentError::NotFound(slug.to_string()))
            }
            Err(source) => return Err(ContentError::Io { path, source }),
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(slug.to_string(), raw.clone());
        }

        Ok(raw)
    }

    /// Load and parse a writing
    pub async fn writing(&self, slug: &str) -> Result<Writing, ContentError> {
        let raw = self.load(slug).await?;
        Writing::parse(slug, &raw)
    }

    /// Load and parse every writing, skipping the ones that fail
    ///
    /// Writings are ordered newest first; undated writings go last, by slug.
    pub async fn writings(&self) -> Vec<Writing> {
        let mut writings = Vec::new();
        for slug in self.slugs() {
            match self.writing(&slug).await {
                Ok(writing) => writings.push(writing),
                Err(e) => tracing::warn!("Skipping writing {}: {}", slug, e),
            }
        }

        writings.sort_by(|a, b| {
            b.metadata
                .parse_date()
                .cmp(&a.metadata.parse_date())
                .then_with(|| a.slug.cmp(&b.slug))
        });
        writings
    }
}

/// Index the markdown files directly under `root`
fn scan(root: &Path) -> BTreeMap<String, PathBuf> {
    let mut index = BTreeMap::new();
    if !root.is_dir() {
        tracing::warn!("Writings directory {:?} does not exist", root);
        return index;
    }

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown_file(path) {
            continue;
        }

        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        if validate_slug(slug).is_err() {
            tracing::warn!("Ignoring {:?}: file name is not a valid slug", path);
            continue;
        }

        index.insert(slug.to_string(), path.to_path_buf());
    }

    index
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md")
        .unwrap_or(false)
}
