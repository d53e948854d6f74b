use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use catalog::{render_page, AssetChecker, Catalog};
use tracing::{info, instrument};

use crate::config::SiteConfig;

/// Loads the manifest when given, otherwise scans the audio tree.
pub fn load_catalog(config: &SiteConfig, site_root: &Path, manifest: Option<&Path>) -> Result<Catalog> {
    match manifest {
        Some(path) => Ok(Catalog::load(path)?),
        None => Ok(Catalog::discover(
            site_root,
            &config.layout(),
            &config.title,
            &config.description,
            config.code_url.as_deref(),
        )?),
    }
}

fn ensure_valid(catalog: &Catalog) -> Result<()> {
    let violations = catalog.validate();
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        eprintln!("✗ {violation}");
    }
    bail!("catalog has {} problem(s)", violations.len())
}

#[instrument(skip(config), level = "debug")]
pub fn build(
    config: &SiteConfig,
    site_root: &Path,
    manifest: Option<&Path>,
    write_manifest: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let catalog = load_catalog(config, site_root, manifest)?;
    ensure_valid(&catalog)?;

    if let Some(path) = write_manifest {
        catalog.save(path)?;
        info!(?path, "wrote manifest");
    }

    let output = output.unwrap_or_else(|| site_root.join(&config.output));
    let html = render_page(&catalog, &config.page_options());
    std::fs::write(&output, html).with_context(|| format!("failed to write {}", output.display()))?;
    info!(?output, n_examples = catalog.examples.len(), "wrote page");

    Ok(output)
}

/// Reports catalog violations and unresolved assets in one pass, failing
/// afterwards when either list is non-empty.
#[instrument(skip(config), level = "debug")]
pub async fn check(config: &SiteConfig, site_root: &Path, manifest: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(config, site_root, manifest)?;
    let violations = catalog.validate();
    for violation in &violations {
        eprintln!("✗ {violation}");
    }

    let checker = AssetChecker::new(
        config.check.concurrency,
        Duration::from_secs(config.check.timeout_secs),
    )?;
    let unresolved = checker.check(&catalog, site_root).await;
    let n_assets: usize = catalog.examples.iter().map(|e| e.entries.len() * 2).sum();
    for asset in &unresolved {
        eprintln!("✗ {asset}");
    }

    match (violations.len(), unresolved.len()) {
        (0, 0) => {
            println!("All {n_assets} assets resolve.");
            Ok(())
        }
        (0, k) => bail!("{k} of {n_assets} assets do not resolve"),
        (v, 0) => bail!("catalog has {v} problem(s)"),
        (v, k) => bail!("catalog has {v} problem(s) and {k} of {n_assets} assets do not resolve"),
    }
}
