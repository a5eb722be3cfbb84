// Registry CSV export: deduplicated registry and audit dump

use std::fs::File;
use std::io::Write;
use std::path::Path;

use plantreg_conflate::{AuditLog, Registry};

use crate::error::IoError;
use crate::row::{Layout, RegistryRow, WARNING_BANNER};

pub fn registry_rows(registry: &Registry, years: &[i32]) -> Vec<RegistryRow> {
    registry.records().map(|r| RegistryRow::from_record(r, years)).collect()
}

pub fn dump_rows(audit: &AuditLog, years: &[i32]) -> Vec<RegistryRow> {
    audit.iter().map(|e| RegistryRow::from_audit(e, years)).collect()
}

/// Banner line, header row, then one line per row.
pub fn write_rows<W: Write>(mut out: W, rows: &[RegistryRow], layout: &Layout) -> Result<(), IoError> {
    let context = "registry export";
    let csv_error = |source| IoError::Csv {
        context: context.to_string(),
        source,
    };

    writeln!(out, "{WARNING_BANNER}").map_err(|e| csv_error(e.into()))?;
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer.write_record(layout.header()).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row.to_fields(layout)).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| csv_error(e.into()))?;
    Ok(())
}

pub fn write_rows_to_path(path: &Path, rows: &[RegistryRow], layout: &Layout) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IoError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_rows(file, rows, layout).map_err(|e| match e {
        IoError::Csv { source, .. } => IoError::Csv {
            context: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// The deduplicated registry, in id order.
pub fn write_registry_csv(path: &Path, registry: &Registry, years: &[i32]) -> Result<usize, IoError> {
    let rows = registry_rows(registry, years);
    write_rows_to_path(path, &rows, &Layout::registry(years))?;
    tracing::info!(rows = rows.len(), path = %path.display(), "wrote registry");
    Ok(rows.len())
}

/// Every candidate with its registry flag, no capacity filter.
pub fn write_dump_csv(path: &Path, audit: &AuditLog, years: &[i32]) -> Result<usize, IoError> {
    let rows = dump_rows(audit, years);
    write_rows_to_path(path, &rows, &Layout::dump(years))?;
    tracing::info!(rows = rows.len(), path = %path.display(), "wrote data dump");
    Ok(rows.len())
}
