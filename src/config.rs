use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendarConfig;

pub const DEFAULT_UNDO_DEPTH: usize = 5;

/// Host-supplied engine settings. Nothing in the crate reads global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo entries; older ones are evicted silently.
    pub max_undo_depth: usize,
    pub calendar: WorkCalendarConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: DEFAULT_UNDO_DEPTH,
            calendar: WorkCalendarConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth.max(1);
        self
    }
}
