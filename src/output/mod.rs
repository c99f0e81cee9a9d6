//! On-disk layout of a run.
//!
//! ```text
//! <out>/_meta/config_effective.json
//! <out>/_meta/schema_call.json
//! <out>/_meta/field_descriptions.json
//! <out>/_meta/prompt_template.json
//! <out>/_meta/generation_report.json
//! <out>/_meta/manifest.json
//! <out>/<YYYY-MM-DD>/<call_id>.json
//! ```
//!
//! Day directories are written to a hidden staging directory first and
//! renamed into place, replacing whatever a previous run left under the
//! same date.

use crate::error::{GenerationError, GenerationResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const META_DIR: &str = "_meta";
pub const CONFIG_FILE: &str = "config_effective.json";
pub const SCHEMA_FILE: &str = "schema_call.json";
pub const DESCRIPTIONS_FILE: &str = "field_descriptions.json";
pub const PROMPT_FILE: &str = "prompt_template.json";
pub const REPORT_FILE: &str = "generation_report.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// One written file, relative to the output root with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFiles {
    pub date: NaiveDate,
    pub files: Vec<ManifestEntry>,
}

/// Per-run file list with content hashes. Written last; it does not list
/// itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub seed: String,
    pub metadata: Vec<ManifestEntry>,
    pub days: Vec<DayFiles>,
}

impl Manifest {
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.metadata
            .iter()
            .chain(self.days.iter().flat_map(|day| day.files.iter()))
    }

    pub fn file_count(&self) -> usize {
        self.entries().count()
    }
}

fn output_error(path: &Path) -> impl FnOnce(io::Error) -> GenerationError + '_ {
    move |source| GenerationError::Output {
        path: path.to_path_buf(),
        source,
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn hash_path(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn to_pretty_json<T: Serialize>(value: &T, what: &str) -> GenerationResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| GenerationError::Serialize {
        what: what.to_string(),
        source,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn read_manifest(path: &Path) -> GenerationResult<Manifest> {
    let raw = fs::read(path).map_err(output_error(path))?;
    serde_json::from_slice(&raw).map_err(|source| GenerationError::Serialize {
        what: path.display().to_string(),
        source,
    })
}

/// Writes metadata and day groups under one output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn create(root: impl Into<PathBuf>) -> GenerationResult<Self> {
        let root = root.into();
        let meta = root.join(META_DIR);
        fs::create_dir_all(&meta).map_err(output_error(&meta))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join(META_DIR).join(name)
    }

    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(date.to_string())
    }

    fn staging_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!(".{date}.partial"))
    }

    /// Serializes `value` into `_meta/<name>`.
    pub fn write_meta<T: Serialize>(
        &self,
        name: &str,
        value: &T,
    ) -> GenerationResult<ManifestEntry> {
        let bytes = to_pretty_json(value, name)?;
        let path = self.meta_path(name);
        fs::write(&path, &bytes).map_err(output_error(&path))?;
        debug!(path = %path.display(), "metadata written");
        Ok(ManifestEntry {
            path: format!("{META_DIR}/{name}"),
            sha256: hash_bytes(&bytes),
            bytes: bytes.len() as u64,
        })
    }

    /// Writes one day's records as `<call_id>.json` files and swaps the
    /// finished directory into place. `records` holds already serialized
    /// documents keyed by call id.
    pub fn write_day(
        &self,
        date: NaiveDate,
        records: &[(String, Vec<u8>)],
    ) -> GenerationResult<DayFiles> {
        let staging = self.staging_dir(date);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(output_error(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(output_error(&staging))?;

        let mut files = Vec::with_capacity(records.len());
        for (call_id, bytes) in records {
            let name = format!("{call_id}.json");
            let path = staging.join(&name);
            fs::write(&path, bytes).map_err(output_error(&path))?;
            files.push(ManifestEntry {
                path: format!("{date}/{name}"),
                sha256: hash_bytes(bytes),
                bytes: bytes.len() as u64,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let target = self.day_dir(date);
        if target.exists() {
            fs::remove_dir_all(&target).map_err(output_error(&target))?;
        }
        fs::rename(&staging, &target).map_err(output_error(&target))?;
        debug!(%date, files = files.len(), "day group written");
        Ok(DayFiles { date, files })
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> GenerationResult<PathBuf> {
        self.write_meta(MANIFEST_FILE, manifest)?;
        Ok(self.meta_path(MANIFEST_FILE))
    }
}
