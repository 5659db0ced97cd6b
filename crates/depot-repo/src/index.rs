use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::{yaml, ArtifactId, ArtifactVersion, Result};

const INDEX_API_VERSION: &str = "v1";

/// The mutable (name, version) → metadata mapping behind the published
/// repository index.
///
/// The synchronizer clones the current index, applies one diff's worth of
/// mutations to the clone, renders it with [`Index::regenerate`] and swaps the
/// clone in on success. Readers therefore never observe a partially mutated
/// index.
#[derive(Clone, Debug)]
pub struct Index {
    base_url: String,
    entries: BTreeMap<String, Vec<ArtifactVersion>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexDocument<'a> {
    api_version: &'a str,
    generated: String,
    entries: &'a BTreeMap<String, Vec<ArtifactVersion>>,
}

impl Index {
    /// Creates an empty index. `base_url` is the public prefix stamped into
    /// download URLs; pass an empty string for relative URLs.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inserts a freshly parsed version. Upserts by (name, version): an
    /// already-present key is overwritten, matching [`Index::update_entry`].
    pub fn add_entry(&mut self, version: ArtifactVersion) {
        self.upsert(version);
    }

    /// Replaces the metadata for a re-resolved version. Upserts by
    /// (name, version): a missing key is inserted, matching
    /// [`Index::add_entry`]. The distinction between the two is for callers'
    /// logging only.
    pub fn update_entry(&mut self, version: ArtifactVersion) {
        self.upsert(version);
    }

    /// Inserts or replaces the entry keyed by (name, version).
    fn upsert(&mut self, version: ArtifactVersion) {
        let versions = self.entries.entry(version.name.clone()).or_default();
        match versions.iter_mut().find(|v| v.version == version.version) {
            Some(existing) => *existing = version,
            None => versions.push(version),
        }
    }

    /// Removes the entry for `id`. Removing an absent entry is a no-op (the
    /// object may have been invalid and never indexed).
    pub fn remove_entry(&mut self, id: &ArtifactId) {
        if let Some(versions) = self.entries.get_mut(&id.name) {
            versions.retain(|v| v.version != id.version);
            if versions.is_empty() {
                self.entries.remove(&id.name);
            }
        }
    }

    pub fn get(&self, name: &str, version: &str) -> Option<&ArtifactVersion> {
        self.entries
            .get(name)?
            .iter()
            .find(|v| v.version == version)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the published index document.
    ///
    /// Pure transformation: no data is fetched, and identical entry sets
    /// render identically apart from the stamped `generated` timestamp.
    pub fn regenerate(&self) -> Result<String> {
        let entries = self.stamped_entries();
        let document = IndexDocument {
            api_version: INDEX_API_VERSION,
            generated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            entries: &entries,
        };
        yaml::to_yaml(&serde_json::to_value(&document)?)
    }

    /// Returns the entries with download URLs stamped from the base URL,
    /// sorted by version within each name for deterministic output.
    fn stamped_entries(&self) -> BTreeMap<String, Vec<ArtifactVersion>> {
        let mut entries = self.entries.clone();
        for versions in entries.values_mut() {
            versions.sort_by(|a, b| a.version.cmp(&b.version));
            for version in versions {
                version.urls = vec![self.download_url(&version.id())];
            }
        }
        entries
    }

    fn download_url(&self, id: &ArtifactId) -> String {
        let filename = id.filename();
        if self.base_url.is_empty() {
            format!("charts/{filename}")
        } else {
            format!("{}/charts/{}", self.base_url.trim_end_matches('/'), filename)
        }
    }
}
