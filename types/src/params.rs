//! Runoff parameters.

use serde::{Deserialize, Serialize};

/// Tunables for the runoff resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunoffParams {
    /// Delay between the parent's finalization and the runoff's start time.
    pub cooldown_secs: u64,

    /// Appended to the parent's title to name the runoff.
    pub title_suffix: String,
}

impl RunoffParams {
    /// Default gap between finalization and the runoff opening: 5 minutes.
    pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

    pub const DEFAULT_TITLE_SUFFIX: &'static str = " - Runoff";

    /// Title for a runoff spawned from an election called `parent_title`.
    pub fn runoff_title(&self, parent_title: &str) -> String {
        format!("{parent_title}{}", self.title_suffix)
    }

    /// Description for a runoff spawned from election `parent_id`.
    pub fn runoff_description(parent_id: u64, parent_title: &str) -> String {
        format!("Runoff election for tied candidates of election #{parent_id} ({parent_title})")
    }
}

impl Default for RunoffParams {
    fn default() -> Self {
        Self {
            cooldown_secs: Self::DEFAULT_COOLDOWN_SECS,
            title_suffix: Self::DEFAULT_TITLE_SUFFIX.to_string(),
        }
    }
}
