use std::fmt;

use serde::{Deserialize, Serialize};

/// Fingerprint of a loaded mesh, used to namespace per-model annotation state.
///
/// Derived from the byte size of the mesh file: identical content always maps
/// to the same id, so annotations survive a reload. Distinct files of equal size
/// collide; the host is expected to accept that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Wraps an explicit identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the id from the size in bytes of the loaded mesh file.
    #[must_use]
    pub fn from_byte_len(len: usize) -> Self {
        Self(format!("model_{len}"))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
