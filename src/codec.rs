//! Probe file encoding.
//!
//! Probe files are pretty-printed JSON arrays of `{name, type, config}`
//! objects. Encoding normalizes every probe's condition in place before
//! writing; decoding is strict and never returns a partial list.

use crate::error::AuthorError;
use crate::probe::Probe;
use crate::schema_loader::{Contract, validate};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const INLINE_ORIGIN: &str = "<input>";

/// Encode `probes`, stripping vacuous conditions from them first.
pub fn serialize(probes: &mut [Probe]) -> Result<String, AuthorError> {
    let stripped = probes
        .iter_mut()
        .map(Probe::normalize_condition)
        .filter(|changed| *changed)
        .count();
    if stripped > 0 {
        debug!(stripped, "removed vacuous conditions");
    }
    Ok(serde_json::to_string_pretty(&*probes)?)
}

/// Decode a probe file body.
pub fn deserialize(text: &str) -> Result<Vec<Probe>, AuthorError> {
    decode(INLINE_ORIGIN, text)
}

fn decode(origin: &str, text: &str) -> Result<Vec<Probe>, AuthorError> {
    let malformed = |detail: String| AuthorError::MalformedProbeFile {
        origin: origin.to_string(),
        detail,
    };
    let value: Value = serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
    validate(Contract::ProbeFile, &value).map_err(malformed)?;
    serde_json::from_value(value).map_err(|err| malformed(err.to_string()))
}

pub fn read_probe_file(path: &Path) -> Result<Vec<Probe>, AuthorError> {
    let text = fs::read_to_string(path).map_err(|err| AuthorError::io(path, err))?;
    let probes = decode(&path.display().to_string(), &text)?;
    debug!(path = %path.display(), count = probes.len(), "read probe file");
    Ok(probes)
}

/// Encode and write `probes` to `path`, replacing it atomically.
///
/// The body goes to a temporary file in the same directory which is then
/// renamed over `path`, so a failure never leaves a truncated probe file.
pub fn write_probe_file(path: &Path, probes: &mut [Probe]) -> Result<(), AuthorError> {
    let mut body = serialize(probes)?;
    body.push('\n');

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(|err| AuthorError::io(dir, err))?;
    staged
        .write_all(body.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| AuthorError::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| AuthorError::io(path, err.error))?;
    info!(path = %path.display(), count = probes.len(), "wrote probe file");
    Ok(())
}
