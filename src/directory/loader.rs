//! Directory file parsing
//!
//! Line format: `node_id ip port [files]`, whitespace separated, with the
//! optional files column comma separated. Blank lines and lines starting
//! with `#` are skipped. A malformed line is logged and skipped; only a file
//! that cannot be read at all is an error.
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use tracing::{info, warn};

use super::split_file_list;
use crate::config_error;
use crate::error::Result;
use crate::node::NodeId;

/// One parsed line of the directory file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: NodeId,
    pub address: SocketAddr,
    pub files: Vec<String>,
}

/// Read and parse a directory file
pub fn load_directory_file(path: &Path) -> Result<Vec<DirectoryEntry>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        config_error!("Cannot read directory file {}: {}", path.display(), e)
    })?;
    let entries = parse_directory(&contents);
    info!(
        "Loaded {} nodes from directory file {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

/// Parse directory text, skipping blank, comment and malformed lines
pub fn parse_directory(contents: &str) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(entry) => {
                if entries.iter().any(|existing| existing.id == entry.id) {
                    warn!(
                        "Directory line {}: duplicate node id {}, skipped",
                        index + 1,
                        entry.id
                    );
                    continue;
                }
                entries.push(entry);
            }
            Err(reason) => warn!("Directory line {}: {} ({:?}), skipped", index + 1, reason, line),
        }
    }
    entries
}

fn parse_line(line: &str) -> std::result::Result<DirectoryEntry, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(format!("expected 3 or 4 fields, found {}", fields.len()));
    }

    let id: NodeId = fields[0].parse()?;
    let ip: IpAddr = fields[1]
        .parse()
        .map_err(|e| format!("invalid ip address {:?}: {}", fields[1], e))?;
    let port: u16 = fields[2]
        .parse()
        .map_err(|e| format!("invalid port {:?}: {}", fields[2], e))?;
    let files = fields
        .get(3)
        .map(|column| {
            split_file_list(column)
                .into_iter()
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(DirectoryEntry {
        id,
        address: SocketAddr::new(ip, port),
        files,
    })
}
