use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use harvest_common::{CommentRecord, HarvestError, OutputFormat, Result};

/// UTF-8 byte-order mark. Spreadsheet tools need it to detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `records` to `destination` in `format`.
///
/// Returns `Ok(false)` without touching the filesystem when there is nothing
/// to write.
pub fn persist(records: &[CommentRecord], destination: &Path, format: OutputFormat) -> Result<bool> {
    if records.is_empty() {
        debug!(path = %destination.display(), "No records, skipping write");
        return Ok(false);
    }

    match format {
        OutputFormat::Tabular => write_csv(records, destination)?,
        OutputFormat::Structured => write_json(records, destination)?,
    }

    info!(
        path = %destination.display(),
        records = records.len(),
        format = %format,
        "Records written"
    );
    Ok(true)
}

/// CSV with a BOM and a header row taken from `T`'s field names.
pub(crate) fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path).map_err(|e| HarvestError::persistence(path, e))?);
    file.write_all(UTF8_BOM)
        .map_err(|e| HarvestError::persistence(path, e))?;

    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| HarvestError::persistence(path, e))?;
    }
    writer.flush().map_err(|e| HarvestError::persistence(path, e))?;
    Ok(())
}

pub(crate) fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path).map_err(|e| HarvestError::persistence(path, e))?);
    serde_json::to_writer_pretty(&mut file, value).map_err(|e| HarvestError::persistence(path, e))?;
    file.flush().map_err(|e| HarvestError::persistence(path, e))?;
    Ok(())
}
