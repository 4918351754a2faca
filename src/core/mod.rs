//! Framework-agnostic footprint logic.
//!
//! Everything except [`recorder`] is pure and synchronous. The recorder is the
//! only part that talks to a [`crate::store::FootprintStore`].

/// Monthly aggregate folding, rebuilding and drift detection
pub mod aggregate;
/// Heatmap color scale and legend
pub mod color;
/// Activity categories and emission factor tables
pub mod factors;
/// Chart, heatmap and recent-entry projections
pub mod history;
/// Save, reconcile and history-load flows
pub mod recorder;
/// Footprint scoring
pub mod scoring;
/// Reduction tips per emission category
pub mod tips;
