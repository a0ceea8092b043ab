//! Entry point holding the PocketBase base URL.

use crate::collection::Collection;

/// Handle to a PocketBase backend.
///
/// Holds only the base URL, stored exactly as given: no validation and no
/// trailing-slash normalization. Hand out `Collection` handles with
/// [`PocketbaseClient::collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PocketbaseClient {
    base_url: String,
}

impl PocketbaseClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection<'a>(&'a self, name: &'a str) -> Collection<'a> {
        Collection::new(&self.base_url, name)
    }
}
