//! Dashboard view-model.
//!
//! Selecting a hierarchy level yields a [`FetchRequest`] for the next level's
//! catalog list. Requests may complete in any order; [`DashboardViewModel::resolve`]
//! applies a result only while its target id still matches the selection,
//! so the last selection wins.

use crate::analysis::aggregator::{self, CatalogView};
use crate::api::{ApiError, CatalogService};
use crate::models::{AssessmentStats, ChartPoint, Control, Domain, Metric, Question, Subdomain};
use crate::viewmodel::selection::{HierarchyLevel, HierarchySelection, SelectionAction};
use tracing::{debug, warn};

/// Catalog fetch triggered by a selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Subdomains and questions of a domain.
    Subdomains { domain_id: String },
    Controls { subdomain_id: String },
    Metrics { control_id: String },
}

/// Result payload of a [`FetchRequest`].
#[derive(Debug, Clone)]
pub enum FetchPayload {
    Subdomains {
        subdomains: Vec<Subdomain>,
        questions: Vec<Question>,
    },
    Controls(Vec<Control>),
    Metrics(Vec<Metric>),
}

/// What [`DashboardViewModel::resolve`] did with a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The selection moved on; the payload was discarded.
    Stale,
    /// The fetch failed; state is unchanged and `last_error` is set.
    Failed,
}

impl FetchRequest {
    /// Perform the fetch. The list endpoints are unfiltered; scoping
    /// happens when the payload is resolved.
    pub async fn run(&self, catalog: &dyn CatalogService) -> Result<FetchPayload, ApiError> {
        match self {
            FetchRequest::Subdomains { domain_id } => {
                let (subdomains, questions) = futures::try_join!(
                    catalog.list_subdomains(),
                    catalog.domain_questions(domain_id)
                )?;
                Ok(FetchPayload::Subdomains {
                    subdomains,
                    questions,
                })
            }
            FetchRequest::Controls { .. } => Ok(FetchPayload::Controls(
                catalog.list_controls().await?,
            )),
            FetchRequest::Metrics { .. } => {
                Ok(FetchPayload::Metrics(catalog.list_metrics().await?))
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FetchRequest::Subdomains { .. } => "subdomains",
            FetchRequest::Controls { .. } => "controls",
            FetchRequest::Metrics { .. } => "metrics",
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardViewModel {
    selection: HierarchySelection,
    domains: Vec<Domain>,
    subdomains: Vec<Subdomain>,
    controls: Vec<Control>,
    metrics: Vec<Metric>,
    questions: Vec<Question>,
    stats: Option<AssessmentStats>,
    last_error: Option<String>,
}

impl DashboardViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the domain list and the stats of one assessment.
    pub async fn load_overview(
        &mut self,
        catalog: &dyn CatalogService,
        assessment_id: &str,
    ) -> Result<(), ApiError> {
        let result = futures::try_join!(
            catalog.list_domains(),
            catalog.assessment_stats(assessment_id)
        );

        match result {
            Ok((domains, stats)) => {
                self.domains = domains;
                self.stats = Some(stats);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load dashboard: {}", e);
                self.last_error = Some(format!("Failed to load dashboard: {}", e));
                Err(e)
            }
        }
    }

    #[allow(dead_code)] // Seeds state without a fetch
    pub fn set_domains(&mut self, domains: Vec<Domain>) {
        self.domains = domains;
    }

    #[allow(dead_code)] // Seeds state without a fetch
    pub fn set_stats(&mut self, stats: AssessmentStats) {
        self.stats = Some(stats);
    }

    pub fn selection(&self) -> &HierarchySelection {
        &self.selection
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn stats(&self) -> Option<&AssessmentStats> {
        self.stats.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[allow(dead_code)] // Per-level form of dispatch
    pub fn select_domain(&mut self, domain_id: Option<String>) -> Option<FetchRequest> {
        self.dispatch(SelectionAction::Domain(domain_id))
    }

    #[allow(dead_code)] // Per-level form of dispatch
    pub fn select_subdomain(&mut self, subdomain_id: Option<String>) -> Option<FetchRequest> {
        self.dispatch(SelectionAction::Subdomain(subdomain_id))
    }

    #[allow(dead_code)] // Per-level form of dispatch
    pub fn select_control(&mut self, control_id: Option<String>) -> Option<FetchRequest> {
        self.dispatch(SelectionAction::Control(control_id))
    }

    #[allow(dead_code)] // Per-level form of dispatch
    pub fn select_metric(&mut self, metric_id: Option<String>) {
        self.dispatch(SelectionAction::Metric(metric_id));
    }

    /// Apply a selection change, reset the narrower cached lists and return
    /// the fetch the new selection needs, if any.
    pub fn dispatch(&mut self, action: SelectionAction) -> Option<FetchRequest> {
        let parent_set = match action {
            SelectionAction::Domain(_) => true,
            SelectionAction::Subdomain(_) => self.selection.domain_id().is_some(),
            SelectionAction::Control(_) => self.selection.subdomain_id().is_some(),
            SelectionAction::Metric(_) => self.selection.control_id().is_some(),
        };
        if !parent_set {
            debug!("Ignoring {:?}: parent level not selected", action);
            return None;
        }

        let level = match action {
            SelectionAction::Domain(_) => HierarchyLevel::Domain,
            SelectionAction::Subdomain(_) => HierarchyLevel::Subdomain,
            SelectionAction::Control(_) => HierarchyLevel::Control,
            SelectionAction::Metric(_) => HierarchyLevel::Metric,
        };
        self.selection.apply(action);

        if level <= HierarchyLevel::Domain {
            self.subdomains.clear();
            self.questions.clear();
        }
        if level <= HierarchyLevel::Subdomain {
            self.controls.clear();
        }
        if level <= HierarchyLevel::Control {
            self.metrics.clear();
        }

        match level {
            HierarchyLevel::Domain => self.selection.domain_id().map(|id| FetchRequest::Subdomains {
                domain_id: id.to_string(),
            }),
            HierarchyLevel::Subdomain => {
                self.selection
                    .subdomain_id()
                    .map(|id| FetchRequest::Controls {
                        subdomain_id: id.to_string(),
                    })
            }
            HierarchyLevel::Control => self.selection.control_id().map(|id| FetchRequest::Metrics {
                control_id: id.to_string(),
            }),
            HierarchyLevel::Metric => None,
        }
    }

    /// Whether a request still targets the current selection.
    pub fn is_current(&self, request: &FetchRequest) -> bool {
        match request {
            FetchRequest::Subdomains { domain_id } => {
                self.selection.domain_id() == Some(domain_id.as_str())
            }
            FetchRequest::Controls { subdomain_id } => {
                self.selection.subdomain_id() == Some(subdomain_id.as_str())
            }
            FetchRequest::Metrics { control_id } => {
                self.selection.control_id() == Some(control_id.as_str())
            }
        }
    }

    /// Apply the result of a completed fetch.
    pub fn resolve(
        &mut self,
        request: &FetchRequest,
        result: Result<FetchPayload, ApiError>,
    ) -> FetchOutcome {
        if !self.is_current(request) {
            debug!("Discarding stale {} response for {:?}", request.describe(), request);
            return FetchOutcome::Stale;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to load {}: {}", request.describe(), e);
                self.last_error = Some(format!("Failed to load {}: {}", request.describe(), e));
                return FetchOutcome::Failed;
            }
        };

        match (request, payload) {
            (
                FetchRequest::Subdomains { domain_id },
                FetchPayload::Subdomains {
                    mut subdomains,
                    mut questions,
                },
            ) => {
                subdomains.retain(|s| &s.domain_id == domain_id);
                questions.retain(|q| &q.domain_id == domain_id);
                self.subdomains = subdomains;
                self.questions = questions;
            }
            (FetchRequest::Controls { subdomain_id }, FetchPayload::Controls(mut controls)) => {
                controls.retain(|c| &c.subdomain_id == subdomain_id);
                self.controls = controls;
            }
            (FetchRequest::Metrics { control_id }, FetchPayload::Metrics(mut metrics)) => {
                metrics.retain(|m| &m.control_id == control_id);
                self.metrics = metrics;
            }
            (request, _) => {
                warn!("Payload does not match {} request", request.describe());
                self.last_error = Some(format!(
                    "Failed to load {}: unexpected response",
                    request.describe()
                ));
                return FetchOutcome::Failed;
            }
        }

        self.last_error = None;
        FetchOutcome::Applied
    }

    /// Change the selection and wait for the fetch it triggers.
    ///
    /// Returns `None` when the action triggers no fetch.
    #[allow(dead_code)] // Awaiting form of dispatch and resolve
    pub async fn select(
        &mut self,
        action: SelectionAction,
        catalog: &dyn CatalogService,
    ) -> Option<FetchOutcome> {
        let request = self.dispatch(action)?;
        let result = request.run(catalog).await;
        Some(self.resolve(&request, result))
    }

    /// Chart series for the current selection.
    pub fn derive_chart_series(&self) -> Vec<ChartPoint> {
        let catalog = CatalogView {
            domains: &self.domains,
            subdomains: &self.subdomains,
            controls: &self.controls,
            metrics: &self.metrics,
            questions: &self.questions,
        };
        aggregator::derive_chart_series(self.stats.as_ref(), &catalog, &self.selection)
    }

    /// Names along the selected path, broadest first. Ids the catalog does
    /// not know are shown as-is.
    pub fn breadcrumb(&self) -> Vec<(HierarchyLevel, String)> {
        let mut path = Vec::new();

        if let Some(id) = self.selection.domain_id() {
            let name = self.domains.iter().find(|d| d.id == id).map(|d| d.name.as_str());
            path.push((HierarchyLevel::Domain, name.unwrap_or(id).to_string()));
        }
        if let Some(id) = self.selection.subdomain_id() {
            let name = self.subdomains.iter().find(|s| s.id == id).map(|s| s.name.as_str());
            path.push((HierarchyLevel::Subdomain, name.unwrap_or(id).to_string()));
        }
        if let Some(id) = self.selection.control_id() {
            let name = self.controls.iter().find(|c| c.id == id).map(|c| c.name.as_str());
            path.push((HierarchyLevel::Control, name.unwrap_or(id).to_string()));
        }
        if let Some(id) = self.selection.metric_id() {
            let name = self.metrics.iter().find(|m| m.id == id).map(|m| m.name.as_str());
            path.push((HierarchyLevel::Metric, name.unwrap_or(id).to_string()));
        }

        path
    }
}
