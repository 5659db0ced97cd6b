use std::collections::BTreeMap;

use serde::Serialize;

use crate::Result;

/// File extension identifying artifact packages in storage. Objects without
/// this suffix are invisible to the synchronizer.
pub const ARTIFACT_PACKAGE_EXTENSION: &str = ".tgz";

/// Parser seam for turning raw package content into metadata.
///
/// Implementations understand the archive format of a single artifact; the
/// index layer treats them as opaque. A recognized "this is not an artifact"
/// condition must be reported as [`crate::RepoError::InvalidArtifact`] so the
/// synchronizer can distinguish it from transport failures.
pub trait ArtifactParser: Send + Sync {
    fn parse(&self, content: &[u8]) -> Result<ArtifactVersion>;
}

/// (name, version) identity of an artifact, derivable from a package path
/// without fetching content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactId {
    pub name: String,
    pub version: String,
}

impl ArtifactId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Derives the identity from a package path following the
    /// `<name>-<version>.tgz` convention, where the version is the first
    /// dash-separated suffix that starts with a digit (so hyphenated names
    /// and pre-release versions both survive).
    ///
    /// Returns `None` for paths that do not follow the convention.
    pub fn from_path(path: &str) -> Option<Self> {
        let file = path.rsplit('/').next()?;
        let stem = file.strip_suffix(ARTIFACT_PACKAGE_EXTENSION)?;
        for (idx, _) in stem.match_indices('-') {
            let version = &stem[idx + 1..];
            if version.starts_with(|c: char| c.is_ascii_digit()) {
                let name = &stem[..idx];
                if name.is_empty() || version.is_empty() {
                    return None;
                }
                return Some(Self::new(name, version));
            }
        }
        None
    }

    /// Canonical package filename for this identity.
    pub fn filename(&self) -> String {
        format!("{}-{}{ARTIFACT_PACKAGE_EXTENSION}", self.name, self.version)
    }
}

/// Metadata for one published artifact version.
///
/// `name` and `version` key the index; everything else is passed through into
/// the published document. `urls` is stamped by the index at render time from
/// its base URL and should be left empty by parsers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtifactVersion {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ArtifactVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            digest: None,
            urls: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ArtifactId {
        ArtifactId::new(self.name.clone(), self.version.clone())
    }
}
