use std::time::SystemTime;

/// Descriptor for a single stored object as seen by a listing call.
///
/// An `Object` carries just enough to detect "this path's content changed"
/// without downloading it: the path plus a change marker made of the content
/// length and the last-modified timestamp. Backends that cannot report a
/// modification time leave it unset; such objects always compare as changed
/// (re-resolving is safer than silently keeping a stale entry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    path: String,
    content_length: u64,
    last_modified: Option<SystemTime>,
}

impl Object {
    pub fn new(
        path: impl Into<String>,
        content_length: u64,
        last_modified: Option<SystemTime>,
    ) -> Self {
        Self {
            path: path.into(),
            content_length,
            last_modified,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// Returns whether the object's path ends with the given file extension.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.path.ends_with(extension)
    }

    /// Returns whether two descriptors for the same path denote the same
    /// content. Missing modification times on either side are treated as
    /// ambiguous, i.e. "changed".
    pub fn same_content(&self, other: &Object) -> bool {
        if self.content_length != other.content_length {
            return false;
        }
        match (self.last_modified, other.last_modified) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn has_extension_matches_suffix_only() {
        let object = Object::new("charts/app-1.0.0.tgz", 10, at(1));
        assert!(object.has_extension(".tgz"));
        assert!(!object.has_extension(".prov"));

        let lookalike = Object::new("charts/app-1.0.0.tgz.bak", 10, at(1));
        assert!(!lookalike.has_extension(".tgz"));
    }

    #[test]
    fn same_content_requires_matching_marker() {
        let a = Object::new("a.tgz", 10, at(1));
        assert!(a.same_content(&Object::new("a.tgz", 10, at(1))));
        assert!(!a.same_content(&Object::new("a.tgz", 11, at(1))));
        assert!(!a.same_content(&Object::new("a.tgz", 10, at(2))));
    }

    #[test]
    fn missing_modification_time_is_ambiguous() {
        let a = Object::new("a.tgz", 10, None);
        assert!(!a.same_content(&Object::new("a.tgz", 10, None)));
        assert!(!a.same_content(&Object::new("a.tgz", 10, at(1))));
    }
}
