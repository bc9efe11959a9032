//! In-memory [`CatalogService`] used by the view-model tests.

use crate::api::error::Result;
use crate::api::{ApiError, CatalogService};
use crate::models::{
    AssessmentStats, Control, Domain, Metric, Question, Response, SubmissionReceipt, Subdomain,
};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeCatalog {
    pub domains: Vec<Domain>,
    pub subdomains: Vec<Subdomain>,
    pub controls: Vec<Control>,
    pub metrics: Vec<Metric>,
    pub questions: Vec<Question>,
    pub stats: AssessmentStats,
    fail: bool,
    submitted: Mutex<Vec<Vec<Response>>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a connection error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn submitted(&self) -> Vec<Vec<Response>> {
        self.submitted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(ApiError::Connect {
                url: "http://fake/api".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

pub fn subdomain(id: &str, domain_id: &str, name: &str) -> Subdomain {
    Subdomain {
        id: id.to_string(),
        domain_id: domain_id.to_string(),
        name: name.to_string(),
        description: None,
    }
}

pub fn control(id: &str, subdomain_id: &str, name: &str) -> Control {
    Control {
        id: id.to_string(),
        subdomain_id: subdomain_id.to_string(),
        name: name.to_string(),
        definition: format!("{} definition", name),
    }
}

pub fn metric(id: &str, control_id: &str, name: &str) -> Metric {
    Metric {
        id: id.to_string(),
        control_id: control_id.to_string(),
        name: name.to_string(),
        description: None,
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.check()?;
        Ok(self.domains.clone())
    }

    async fn domain_questions(&self, domain_id: &str) -> Result<Vec<Question>> {
        self.check()?;
        Ok(self
            .questions
            .iter()
            .filter(|q| q.domain_id == domain_id)
            .cloned()
            .collect())
    }

    async fn list_subdomains(&self) -> Result<Vec<Subdomain>> {
        self.check()?;
        Ok(self.subdomains.clone())
    }

    async fn list_controls(&self) -> Result<Vec<Control>> {
        self.check()?;
        Ok(self.controls.clone())
    }

    async fn list_metrics(&self) -> Result<Vec<Metric>> {
        self.check()?;
        Ok(self.metrics.clone())
    }

    async fn assessment_stats(&self, _assessment_id: &str) -> Result<AssessmentStats> {
        self.check()?;
        Ok(self.stats.clone())
    }

    async fn submit_assessment(&self, responses: &[Response]) -> Result<SubmissionReceipt> {
        self.check()?;
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(responses.to_vec());
        Ok(SubmissionReceipt {
            assessment_id: format!("assessment-{}", submitted.len()),
            message: "Assessment submitted successfully".to_string(),
        })
    }
}
