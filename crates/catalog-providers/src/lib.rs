mod local;
mod spotify;

pub use local::*;
pub use spotify::*;

use std::path::PathBuf;

/// A playable track as described by a catalog, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub artwork: Option<String>,
    pub preview: Preview,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Remote(String),
    Local(PathBuf),
}

impl Preview {
    pub(crate) fn from_locator(locator: &str) -> Self {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            Preview::Remote(locator.to_string())
        } else {
            Preview::Local(PathBuf::from(locator))
        }
    }
}
