// Roster document loading: JSON datasets and flat CSV rosters.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::athlete::RawAthlete;
use crate::pipeline::RawDataset;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid roster JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("unsupported roster format for {path} (expected .json or .csv)")]
    UnsupportedExtension { path: String },
}

/// A JSON roster is either a full dataset document or a bare athlete array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    Dataset(RawDataset),
    Athletes(Vec<RawAthlete>),
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_json_from_reader<R: Read>(rdr: R) -> Result<RawDataset, serde_json::Error> {
    let doc: RosterDocument = serde_json::from_reader(rdr)?;
    Ok(match doc {
        RosterDocument::Dataset(dataset) => dataset,
        RosterDocument::Athletes(athletes) => RawDataset {
            athletes,
            ..RawDataset::default()
        },
    })
}

/// Header names are roster field names; empty cells are left out so they
/// read as untested. Unknown columns are ignored.
fn load_csv_from_reader<R: Read>(rdr: R) -> Result<Vec<RawAthlete>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let headers = reader.headers()?.clone();
    let mut athletes = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed roster row {}: {}", line + 2, e);
                continue;
            }
        };

        let fields: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.to_string(), Value::String(cell.to_string())))
            .collect();
        if fields.is_empty() {
            debug!(row = line + 2, "skipping blank roster row");
            continue;
        }

        match serde_json::from_value::<RawAthlete>(Value::Object(fields)) {
            Ok(athlete) => athletes.push(athlete),
            Err(e) => warn!("skipping roster row {}: {}", line + 2, e),
        }
    }
    Ok(athletes)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load a JSON dataset document (or bare athlete array).
pub fn load_json_roster(path: &Path) -> Result<RawDataset, RosterError> {
    let file = open(path)?;
    load_json_from_reader(std::io::BufReader::new(file)).map_err(|e| RosterError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load a flat CSV roster. The result carries no sport, constants or
/// sessions.
pub fn load_csv_roster(path: &Path) -> Result<RawDataset, RosterError> {
    let file = open(path)?;
    let athletes = load_csv_from_reader(file).map_err(|e| RosterError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(RawDataset {
        athletes,
        ..RawDataset::default()
    })
}

/// Load a roster, choosing the format by file extension.
pub fn load_roster(path: &Path) -> Result<RawDataset, RosterError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => load_json_roster(path),
        Some("csv") => load_csv_roster(path),
        _ => Err(RosterError::UnsupportedExtension {
            path: path.display().to_string(),
        }),
    }
}

fn open(path: &Path) -> Result<std::fs::File, RosterError> {
    std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
