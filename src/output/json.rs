//! JSON export of emitted products
//!
//! Products are written as one array of flat objects: the mandatory keys in
//! fixed order followed by each product's attributes.

use crate::output::traits::{OutputError, OutputResult};
use crate::scrape::ProductRecord;
use crate::storage::Storage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes products as a pretty-printed JSON array
pub fn write_products_json<W: Write>(products: &[ProductRecord], writer: W) -> OutputResult<()> {
    serde_json::to_writer_pretty(writer, products)?;
    Ok(())
}

/// Exports the products of a run (or of every run) to `path`
///
/// # Returns
///
/// The number of products written
pub fn export_products_json(
    storage: &dyn Storage,
    run_id: Option<i64>,
    path: &Path,
) -> OutputResult<usize> {
    let products = storage
        .get_products(run_id)
        .map_err(|e| OutputError::Storage(e.to_string()))?;

    let mut writer = BufWriter::new(File::create(path)?);
    write_products_json(&products, &mut writer)?;
    writer.flush()?;

    tracing::info!("Exported {} product(s) to {}", products.len(), path.display());
    Ok(products.len())
}
