//! View-models for the dashboard and the assessment flow.

pub mod assessment;
pub mod dashboard;
pub mod selection;

#[cfg(test)]
pub(crate) mod testing;

pub use assessment::{AssessmentFlow, FlowError};
pub use dashboard::{DashboardViewModel, FetchOutcome};
pub use selection::{HierarchyLevel, SelectionAction};
