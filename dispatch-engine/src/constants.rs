//! Centralized tuning constants for the planning engine.
//!
//! These values define the deterministic math for assignment and training
//! recommendations. `PlannerConfig` uses them as defaults; the search caps
//! (team size, selected missions) bound the exponential search.

/// Largest team a single mission accepts.
pub const MAX_TEAM_SIZE: usize = 3;

/// Level assumed for an owned character with no recorded level.
pub const DEFAULT_LEVEL: u32 = 1;

// Search bounds ------------------------------------------------------------
pub(crate) const DEFAULT_MAX_SELECTED_MISSIONS: usize = 4;
pub(crate) const DEFAULT_MAX_RECOMMENDATIONS: usize = 20;

// Training priority weights ------------------------------------------------
pub(crate) const PRIORITY_PRIMARY_WEIGHT: f64 = 1000.0;
pub(crate) const PRIORITY_SECONDARY_WEIGHT: f64 = 10.0;
pub(crate) const PRIORITY_RARITY_WEIGHT: f64 = 1.0;
pub(crate) const PRIORITY_LEVEL_GAP_WEIGHT: f64 = 0.5;

// Labels -------------------------------------------------------------------
pub(crate) const FALLBACK_LOCALE: &str = "en";
