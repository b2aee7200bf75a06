//! Generator module - writes the site out as static HTML files

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::pages::Site;
use crate::Folio;

/// Summary of a generation run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Writing pages written
    pub writings: usize,
    /// Static assets copied
    pub assets: usize,
}

/// Static site generator over the embedded templates
pub struct Generator {
    site: Site,
    public_dir: PathBuf,
    static_dir: PathBuf,
}

impl Generator {
    /// Create a new generator
    pub fn new(folio: &Folio) -> Result<Self> {
        Ok(Self {
            site: Site::new(folio)?,
            public_dir: folio.public_dir.clone(),
            static_dir: folio.static_dir.clone(),
        })
    }

    /// Generate the entire site
    ///
    /// Writings that cannot be loaded are skipped with a warning; any
    /// template failure aborts the run.
    pub async fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.public_dir)?;

        let assets = self.copy_static_assets()?;

        // Newest first, unreadable writings already dropped
        let writings = self.site.store().writings().await;
        tracing::info!("Loaded {} writings", writings.len());

        self.write_page("index.html", &self.site.index_html(&writings)?)?;

        for writing in &writings {
            let html = self.site.writing_html(writing)?;
            self.write_page(&format!("writings/{}/index.html", writing.slug), &html)?;
            tracing::debug!("Generated: {}", writing.path());
        }

        self.write_page("about/index.html", &self.site.about_page(false)?)?;
        self.write_page("uses/index.html", &self.site.uses_page()?)?;
        self.write_page(
            "404.html",
            &self.site.error_page(404, "This page could not be found."),
        )?;

        Ok(GenerateReport {
            writings: writings.len(),
            assets,
        })
    }

    fn write_page(&self, relative: &str, html: &str) -> Result<()> {
        let dest = self.public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, html)?;
        Ok(())
    }

    /// Copy the static directory into the public directory
    fn copy_static_assets(&self) -> Result<usize> {
        if !self.static_dir.is_dir() {
            tracing::debug!("No static directory at {:?}", self.static_dir);
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.static_dir)?;
            copy_file(path, &self.public_dir.join(relative))?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}
