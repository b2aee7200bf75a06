//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: Timothy Curchod
description: Writings about web development.
default_image: https://telmo.im/og/default.png
twitter: timofey
author: Timothy Curchod

# Directories
writings_dir: writings
public_dir: public
static_dir: static

# Code blocks
highlight:
  theme: base16-ocean.dark

about:
  rotate_interval_secs: 3
"#;

const BASE_CSS: &str = r#"body {
  margin: 0 auto;
  max-width: 42rem;
  padding: 1rem;
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
  line-height: 1.6;
}

.writing-progress {
  position: fixed;
  top: 0;
  left: 0;
  width: 100%;
  height: 5px;
  z-index: 10;
}

.writing-progress-bar {
  width: 0;
  height: 100%;
  background: #1e90ff;
}

.code-block {
  overflow-x: auto;
  padding: 1rem;
  border-radius: 4px;
}

.stack {
  display: flex;
  flex-wrap: wrap;
  gap: 0.5rem;
}
"#;

const HELLO: &str = r#"---
title: Hello World
author:
  name: Timothy Curchod
  twitter: timofey
og:
  description: The first writing on this site.
  image: https://telmo.im/og/default.png
date: {date}
---

Welcome! Writings live in the `writings` directory, one markdown file per
writing, and the file name is the address: this one is served at
`/writings/hello-world`.

Links to other sites [open in a new tab](https://www.markdownguide.org).

```rust
fn main() {
    println!("Hello, world!");
}
```
"#;

/// Initialize a new site in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("writings"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let files = [
        (target_dir.join("_config.yml"), CONFIG.to_string()),
        (target_dir.join("static/base.css"), BASE_CSS.to_string()),
        (
            target_dir.join("writings/hello-world.md"),
            HELLO.replace("{date}", &date),
        ),
    ];

    for (path, content) in files {
        if path.exists() {
            tracing::info!("Keeping existing {:?}", path);
            continue;
        }
        fs::write(&path, content)?;
        tracing::debug!("Created: {:?}", path);
    }

    Ok(())
}
