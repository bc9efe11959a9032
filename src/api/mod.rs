//! Assessment API access.
//!
//! [`CatalogService`] is the seam the view-models depend on; [`ApiClient`]
//! is the HTTP implementation, scoped to a [`Session`] by
//! [`SessionCatalog`].

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiConfig, SessionCatalog};
pub use error::ApiError;

use crate::models::{
    AssessmentStats, Control, Domain, Metric, Question, Response, SubmissionReceipt, Subdomain,
};
use async_trait::async_trait;

/// Catalog and scoring collaborator of the dashboard and assessment flow.
///
/// The list endpoints return the whole collection; scoping by parent id
/// is the caller's job.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_domains(&self) -> error::Result<Vec<Domain>>;

    async fn domain_questions(&self, domain_id: &str) -> error::Result<Vec<Question>>;

    async fn list_subdomains(&self) -> error::Result<Vec<Subdomain>>;

    async fn list_controls(&self) -> error::Result<Vec<Control>>;

    async fn list_metrics(&self) -> error::Result<Vec<Metric>>;

    async fn assessment_stats(&self, assessment_id: &str) -> error::Result<AssessmentStats>;

    async fn submit_assessment(&self, responses: &[Response]) -> error::Result<SubmissionReceipt>;
}
