use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, Result};
use crate::operations::region::{FillParams, CLOSURE_TOLERANCE};
use crate::operations::search::SearchParams;

/// Tunables of the annotation engine.
///
/// Every field has a default, so a host configuration file only needs to name
/// what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path search settings.
    pub search: SearchParams,
    /// Region fill settings.
    pub fill: FillParams,
    /// Distance below which a path counts as returning to its start.
    pub closure_tolerance: f64,
    /// Spray brush radius in model units. `0.0` paints the picked vertex only.
    pub spray_radius: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            fill: FillParams::default(),
            closure_tolerance: CLOSURE_TOLERANCE,
            spray_radius: 0.0,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PersistenceError::Json(e).into())
    }
}
