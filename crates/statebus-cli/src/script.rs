//! Snapshot file loading.

use statebus::{Error, StateSnapshot};

/// Parse a JSON-lines snapshot file.
///
/// Empty lines and lines starting with `//` or `#` are skipped. The first
/// remaining line is the initial state; at least one is required.
pub fn load_snapshots(content: &str) -> Result<Vec<StateSnapshot>, Error> {
    let snapshots = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
        .map(|(line, l)| {
            StateSnapshot::from_json(l)
                .map_err(|e| Error::InvalidSnapshot(format!("line {line}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if snapshots.is_empty() {
        return Err(Error::InvalidSnapshot("no snapshots in input".to_string()));
    }

    Ok(snapshots)
}
