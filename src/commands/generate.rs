//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Folio;

/// Generate the static site into the public directory
pub async fn run(folio: &Folio) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(folio)?;
    let report = generator.generate().await?;

    tracing::info!(
        "Generated {} writings and copied {} assets to {:?}",
        report.writings,
        report.assets,
        folio.public_dir
    );
    tracing::info!("Completed in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
