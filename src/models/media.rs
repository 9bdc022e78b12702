use serde::{Deserialize, Serialize};

/// A file that the upload handler wrote into its own storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredFile {
    filename: String,
}

impl StoredFile {
    pub(crate) fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Reference to an image or video attached to an event.
///
/// On the wire this is just the URL string. Ownership of the underlying file
/// is carried out of band: only the upload handler can produce a reference
/// tagged with a [`StoredFile`], and deserialized references are always
/// treated as externally hosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef {
    url: String,
    #[serde(skip)]
    local: Option<StoredFile>,
}

impl MediaRef {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local: None,
        }
    }

    pub(crate) fn local(url: impl Into<String>, file: StoredFile) -> Self {
        Self {
            url: url.into(),
            local: Some(file),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_file(&self) -> Option<&StoredFile> {
        self.local.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.local.is_some()
    }
}
