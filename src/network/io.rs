//! JSON persistence for [`Network`].

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use super::Network;
use crate::error::DispatchResult;

/// Reads and validates a network from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not valid network
/// JSON, or fails [`Network::validate`].
pub fn read_network(path: &Path) -> DispatchResult<Network> {
    let file = File::open(path)?;
    let network = read_network_from(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        buses = network.buses.len(),
        generators = network.generators.len(),
        snapshots = network.snapshot_count(),
        "network loaded"
    );
    Ok(network)
}

/// Reads and validates a network from any reader.
pub fn read_network_from(reader: impl Read) -> DispatchResult<Network> {
    let network: Network = serde_json::from_reader(reader)?;
    network.validate()?;
    Ok(network)
}

/// Writes the network as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_network(network: &Network, path: &Path) -> DispatchResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_network(network, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes the network as pretty-printed JSON to any writer.
pub fn write_network(network: &Network, writer: impl Write) -> DispatchResult<()> {
    serde_json::to_writer_pretty(writer, network)?;
    Ok(())
}

/// Shorthand for tests and tooling: parse a network from a JSON string.
pub fn network_from_json_str(s: &str) -> DispatchResult<Network> {
    read_network_from(io::Cursor::new(s))
}
