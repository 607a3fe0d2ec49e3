use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    sequences: HashMap<String, SequenceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SequenceEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        targets: Option<String>,
    },
}

impl SequenceEntry {
    fn as_path(&self) -> &str {
        match self {
            SequenceEntry::Path(path) => path,
            SequenceEntry::Detailed { path, .. } => path,
        }
    }

    fn targets(&self) -> Option<&str> {
        match self {
            SequenceEntry::Path(_) => None,
            SequenceEntry::Detailed { targets, .. } => targets.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Stored sequence documents and the initial target values they animate.
pub mod sequences {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.sequences.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.sequences, "sequence", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.sequences, "sequence", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.sequences, "sequence", name)?;
        Ok(resolve_path(entry.as_path()))
    }

    /// Initial target values (`{ target: { property: value } }`), if the
    /// fixture declares any.
    pub fn targets_json(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.sequences, "sequence", name)?;
        match entry.targets() {
            Some(rel) => read_to_string(rel).map(Some),
            None => Ok(None),
        }
    }

    pub fn targets<T: DeserializeOwned>(name: &str) -> Result<Option<T>> {
        let entry = lookup(&MANIFEST.sequences, "sequence", name)?;
        match entry.targets() {
            Some(rel) => super::load_json(rel).map(Some),
            None => Ok(None),
        }
    }
}
