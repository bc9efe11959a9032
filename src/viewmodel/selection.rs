//! Hierarchy filter state for the dashboard.
//!
//! The selection is a prefix path through domain → subdomain → control →
//! metric. All writes go through [`HierarchySelection::apply`], so a set
//! level always implies that every broader level is set too.

use serde::Serialize;
use std::fmt;

/// A level of the assessment taxonomy, broadest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Domain,
    Subdomain,
    Control,
    Metric,
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyLevel::Domain => write!(f, "Domain"),
            HierarchyLevel::Subdomain => write!(f, "Subdomain"),
            HierarchyLevel::Control => write!(f, "Control"),
            HierarchyLevel::Metric => write!(f, "Metric"),
        }
    }
}

/// A change to the selection. `None` (or an empty id) means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    Domain(Option<String>),
    Subdomain(Option<String>),
    Control(Option<String>),
    Metric(Option<String>),
}

/// Current dropdown path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchySelection {
    domain_id: Option<String>,
    subdomain_id: Option<String>,
    control_id: Option<String>,
    metric_id: Option<String>,
}

impl HierarchySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }

    pub fn subdomain_id(&self) -> Option<&str> {
        self.subdomain_id.as_deref()
    }

    pub fn control_id(&self) -> Option<&str> {
        self.control_id.as_deref()
    }

    pub fn metric_id(&self) -> Option<&str> {
        self.metric_id.as_deref()
    }

    /// Apply an action and return whether the selection changed.
    ///
    /// Selecting a level clears every narrower level. Selecting a level
    /// whose parent is unset is ignored.
    pub fn apply(&mut self, action: SelectionAction) -> bool {
        let before = self.clone();

        match action {
            SelectionAction::Domain(id) => {
                self.domain_id = normalize(id);
                self.subdomain_id = None;
                self.control_id = None;
                self.metric_id = None;
            }
            SelectionAction::Subdomain(id) => {
                if self.domain_id.is_some() {
                    self.subdomain_id = normalize(id);
                    self.control_id = None;
                    self.metric_id = None;
                }
            }
            SelectionAction::Control(id) => {
                if self.subdomain_id.is_some() {
                    self.control_id = normalize(id);
                    self.metric_id = None;
                }
            }
            SelectionAction::Metric(id) => {
                if self.control_id.is_some() {
                    self.metric_id = normalize(id);
                }
            }
        }

        debug_assert!(self.is_prefix_path());
        *self != before
    }

    /// The level at which the chart lists entities: one below the most
    /// specific selected level, or the metric level once a control is set.
    pub fn resolved_level(&self) -> HierarchyLevel {
        if self.domain_id.is_none() {
            HierarchyLevel::Domain
        } else if self.subdomain_id.is_none() {
            HierarchyLevel::Subdomain
        } else if self.control_id.is_none() {
            HierarchyLevel::Control
        } else {
            HierarchyLevel::Metric
        }
    }

    fn is_prefix_path(&self) -> bool {
        (self.subdomain_id.is_none() || self.domain_id.is_some())
            && (self.control_id.is_none() || self.subdomain_id.is_some())
            && (self.metric_id.is_none() || self.control_id.is_some())
    }
}

fn normalize(id: Option<String>) -> Option<String> {
    id.filter(|s| !s.trim().is_empty())
}
