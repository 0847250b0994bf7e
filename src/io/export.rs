//! CSV export of the solved per-snapshot dispatch.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::network::{Network, SeriesTable};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports the dispatch of `network` to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_dispatch_csv(network: &Network, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_dispatch_csv(network, buf)
}

/// Writes one row per snapshot: the snapshot, its weighting, then a column
/// per solved component series named `<kind>:<name>` (generators, storage
/// units and stores by `p`, links and lines by `p0`).
///
/// Series missing for a component are written as empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_dispatch_csv(network: &Network, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let tables: [(&str, &SeriesTable, Vec<&str>); 5] = [
        (
            "generator",
            &network.generators_t.p,
            network.generators.iter().map(|c| c.name.as_str()).collect(),
        ),
        (
            "storage_unit",
            &network.storage_units_t.p,
            network.storage_units.iter().map(|c| c.name.as_str()).collect(),
        ),
        (
            "store",
            &network.stores_t.p,
            network.stores.iter().map(|c| c.name.as_str()).collect(),
        ),
        (
            "link",
            &network.links_t.p0,
            network.links.iter().map(|c| c.name.as_str()).collect(),
        ),
        (
            "line",
            &network.lines_t.p0,
            network.lines.iter().map(|c| c.name.as_str()).collect(),
        ),
    ];

    let mut header = vec!["snapshot".to_string(), "weighting".to_string()];
    for (kind, _, names) in &tables {
        header.extend(names.iter().map(|n| format!("{kind}:{n}")));
    }
    wtr.write_record(&header)?;

    for (t, snapshot) in network.snapshots.iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(snapshot.format(TIME_FORMAT).to_string());
        record.push(format!("{:.4}", network.snapshot_weighting(t)));
        for (_, table, names) in &tables {
            for name in names {
                let cell = table
                    .get(*name)
                    .and_then(|s| s.get(t))
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_default();
                record.push(cell);
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
