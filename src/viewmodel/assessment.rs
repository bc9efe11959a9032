//! Assessment-taking state.
//!
//! [`AssessmentFlow`] owns the Response set of one attempt. Each domain
//! moves `Unanswered -> InProgress -> Complete` as answers are recorded;
//! only complete domains can be submitted, and a successful submission
//! clears their responses for a new attempt.

use crate::api::{ApiError, CatalogService};
use crate::models::{Progress, Question, Response, SubmissionReceipt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by the assessment flow.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Answer {answer_id} does not belong to question {question_id}")]
    UnknownAnswer {
        question_id: String,
        answer_id: String,
    },

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("No domains selected for submission")]
    NothingToSubmit,

    #[error("Domain {domain_id} is incomplete ({progress})")]
    Incomplete { domain_id: String, progress: Progress },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Per-domain answering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainState {
    Unanswered,
    InProgress,
    Complete,
}

impl fmt::Display for DomainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainState::Unanswered => write!(f, "Unanswered"),
            DomainState::InProgress => write!(f, "In progress"),
            DomainState::Complete => write!(f, "Complete"),
        }
    }
}

/// Responses ready to be sent, produced by [`AssessmentFlow::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub domain_ids: Vec<String>,
    pub responses: Vec<Response>,
}

#[derive(Debug, Default)]
pub struct AssessmentFlow {
    /// Questions per domain, in catalog order.
    questions: HashMap<String, Vec<Question>>,
    /// question id -> selected answer id
    responses: HashMap<String, String>,
    submitting: bool,
}

impl AssessmentFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the questions of a domain, replacing any previous set.
    ///
    /// Responses to questions that are no longer listed are dropped.
    pub fn load_domain(&mut self, domain_id: &str, questions: Vec<Question>) {
        let questions: Vec<Question> = questions
            .into_iter()
            .filter(|q| q.domain_id == domain_id)
            .collect();

        if let Some(previous) = self.questions.get(domain_id) {
            for old in previous {
                if !questions.iter().any(|q| q.id == old.id) {
                    self.responses.remove(&old.id);
                }
            }
        }

        debug!("Loaded {} questions for domain {}", questions.len(), domain_id);
        self.questions.insert(domain_id.to_string(), questions);
    }

    pub fn questions(&self, domain_id: &str) -> &[Question] {
        self.questions
            .get(domain_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[allow(dead_code)] // State accessor
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Selected answer for a question, if any.
    pub fn selected_answer(&self, question_id: &str) -> Option<&str> {
        self.responses.get(question_id).map(String::as_str)
    }

    /// Record (or replace) the answer to a question.
    pub fn handle_answer_select(
        &mut self,
        question_id: &str,
        answer_id: &str,
    ) -> Result<(), FlowError> {
        if self.submitting {
            return Err(FlowError::AlreadySubmitting);
        }

        let question = self
            .find_question(question_id)
            .ok_or_else(|| FlowError::UnknownQuestion(question_id.to_string()))?;

        if question.answer(answer_id).is_none() {
            return Err(FlowError::UnknownAnswer {
                question_id: question_id.to_string(),
                answer_id: answer_id.to_string(),
            });
        }

        self.responses
            .insert(question_id.to_string(), answer_id.to_string());
        Ok(())
    }

    pub fn progress_for_domain(&self, domain_id: &str) -> Progress {
        let questions = self.questions(domain_id);
        let answered = questions
            .iter()
            .filter(|q| self.responses.contains_key(&q.id))
            .count();
        Progress::new(answered, questions.len())
    }

    pub fn can_submit(&self, domain_id: &str) -> bool {
        self.progress_for_domain(domain_id).is_complete()
    }

    pub fn state(&self, domain_id: &str) -> DomainState {
        let progress = self.progress_for_domain(domain_id);
        if progress.is_complete() {
            DomainState::Complete
        } else if progress.answered > 0 {
            DomainState::InProgress
        } else {
            DomainState::Unanswered
        }
    }

    /// Collect the responses of complete domains and mark the flow as
    /// submitting.
    pub fn begin_submit(&mut self, domain_ids: &[String]) -> Result<Submission, FlowError> {
        if self.submitting {
            return Err(FlowError::AlreadySubmitting);
        }
        if domain_ids.is_empty() {
            return Err(FlowError::NothingToSubmit);
        }

        // Each domain contributes its responses once, in first-listed order.
        let mut domain_ids = domain_ids.to_vec();
        let mut seen = HashSet::new();
        domain_ids.retain(|id| seen.insert(id.clone()));

        for domain_id in &domain_ids {
            let progress = self.progress_for_domain(domain_id);
            if !progress.is_complete() {
                return Err(FlowError::Incomplete {
                    domain_id: domain_id.clone(),
                    progress,
                });
            }
        }

        let responses = domain_ids
            .iter()
            .flat_map(|d| self.questions(d))
            .filter_map(|q| {
                self.responses.get(&q.id).map(|answer_id| Response {
                    question_id: q.id.clone(),
                    selected_answer_id: answer_id.clone(),
                })
            })
            .collect();

        self.submitting = true;
        Ok(Submission {
            domain_ids,
            responses,
        })
    }

    /// Clear the submitting flag; on success start a new attempt for the
    /// submitted domains.
    pub fn finish_submit(&mut self, submission: &Submission, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            for response in &submission.responses {
                self.responses.remove(&response.question_id);
            }
        }
    }

    /// Submit complete domains through the catalog service.
    pub async fn submit(
        &mut self,
        domain_ids: &[String],
        catalog: &dyn CatalogService,
    ) -> Result<SubmissionReceipt, FlowError> {
        let submission = self.begin_submit(domain_ids)?;
        info!(
            "Submitting {} responses across {} domain(s)",
            submission.responses.len(),
            submission.domain_ids.len()
        );

        let result = catalog.submit_assessment(&submission.responses).await;
        self.finish_submit(&submission, result.is_ok());

        match result {
            Ok(receipt) => {
                info!("Assessment {} stored", receipt.assessment_id);
                Ok(receipt)
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                Err(FlowError::Api(e))
            }
        }
    }

    fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .values()
            .flat_map(|qs| qs.iter())
            .find(|q| q.id == question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::tests::question;
    use crate::viewmodel::testing::FakeCatalog;
    use tokio_test::{assert_err, assert_ok};

    fn five_questions(domain: &str) -> Vec<Question> {
        (1..=5)
            .map(|i| question(&format!("{}-q{}", domain, i), domain, "s1", "c1"))
            .collect()
    }

    fn answer_all(flow: &mut AssessmentFlow, domain: &str) {
        let ids: Vec<String> = flow.questions(domain).iter().map(|q| q.id.clone()).collect();
        for id in ids {
            assert_ok!(flow.handle_answer_select(&id, &format!("{}-a5", id)));
        }
    }

    #[test]
    fn test_three_of_five_answered() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));

        for i in 1..=3 {
            let id = format!("d1-q{}", i);
            assert_ok!(flow.handle_answer_select(&id, &format!("{}-a0", id)));
        }

        let progress = flow.progress_for_domain("d1");
        assert_eq!(progress.answered, 3);
        assert_eq!(progress.total, 5);
        assert_eq!(progress.percentage, 60.0);
        assert!(!flow.can_submit("d1"));
        assert_eq!(flow.state("d1"), DomainState::InProgress);
    }

    #[test]
    fn test_empty_domain_cannot_submit() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", Vec::new());

        let progress = flow.progress_for_domain("d1");
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percentage, 0.0);
        assert!(!flow.can_submit("d1"));
        assert!(!flow.can_submit("never-loaded"));
        assert_eq!(flow.state("d1"), DomainState::Unanswered);
    }

    #[test]
    fn test_progress_bounds_hold() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        flow.load_domain("d2", five_questions("d2"));
        answer_all(&mut flow, "d2");

        for domain in ["d1", "d2", "d3"] {
            let p = flow.progress_for_domain(domain);
            assert!(p.answered <= p.total);
        }
    }

    #[test]
    fn test_reselect_overwrites_response() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));

        assert_ok!(flow.handle_answer_select("d1-q1", "d1-q1-a0"));
        assert_ok!(flow.handle_answer_select("d1-q1", "d1-q1-a5"));

        assert_eq!(flow.selected_answer("d1-q1"), Some("d1-q1-a5"));
        assert_eq!(flow.progress_for_domain("d1").answered, 1);
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));

        assert_eq!(
            flow.handle_answer_select("nope", "x"),
            Err(FlowError::UnknownQuestion("nope".to_string()))
        );
        assert!(matches!(
            flow.handle_answer_select("d1-q1", "d1-q2-a5"),
            Err(FlowError::UnknownAnswer { .. })
        ));
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        assert_eq!(flow.state("d1"), DomainState::Unanswered);

        assert_ok!(flow.handle_answer_select("d1-q1", "d1-q1-a5"));
        assert_eq!(flow.state("d1"), DomainState::InProgress);

        answer_all(&mut flow, "d1");
        assert_eq!(flow.state("d1"), DomainState::Complete);
        assert!(flow.can_submit("d1"));
    }

    #[test]
    fn test_incomplete_submission_is_refused() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        flow.load_domain("d2", five_questions("d2"));
        answer_all(&mut flow, "d1");

        let err = assert_err!(flow.begin_submit(&["d1".to_string(), "d2".to_string()]));
        assert!(matches!(err, FlowError::Incomplete { ref domain_id, .. } if domain_id == "d2"));
        assert!(!flow.is_submitting());

        assert_eq!(flow.begin_submit(&[]), Err(FlowError::NothingToSubmit));
    }

    #[test]
    fn test_reentrant_submit_is_suppressed() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        answer_all(&mut flow, "d1");

        let submission = assert_ok!(flow.begin_submit(&["d1".to_string()]));
        assert_eq!(submission.responses.len(), 5);
        assert_eq!(
            flow.begin_submit(&["d1".to_string()]),
            Err(FlowError::AlreadySubmitting)
        );
        assert_eq!(
            flow.handle_answer_select("d1-q1", "d1-q1-a0"),
            Err(FlowError::AlreadySubmitting)
        );

        flow.finish_submit(&submission, false);
        assert!(!flow.is_submitting());
        assert!(flow.can_submit("d1"));
    }

    #[test]
    fn test_repeated_domain_is_submitted_once() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        flow.load_domain("d2", five_questions("d2"));
        answer_all(&mut flow, "d1");
        answer_all(&mut flow, "d2");

        let ids = ["d1", "d2", "d1"].map(String::from);
        let submission = assert_ok!(flow.begin_submit(&ids));

        assert_eq!(submission.domain_ids, vec!["d1".to_string(), "d2".to_string()]);
        assert_eq!(submission.responses.len(), 10);
        let unique: HashSet<_> = submission.responses.iter().map(|r| &r.question_id).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_reload_drops_orphaned_responses() {
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        answer_all(&mut flow, "d1");

        let mut fewer = five_questions("d1");
        fewer.truncate(2);
        flow.load_domain("d1", fewer);

        assert_eq!(flow.selected_answer("d1-q5"), None);
        assert_eq!(flow.progress_for_domain("d1").answered, 2);
        assert!(flow.can_submit("d1"));
    }

    #[tokio::test]
    async fn test_successful_submit_starts_new_attempt() {
        let catalog = FakeCatalog::new();
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        flow.load_domain("d2", five_questions("d2"));
        answer_all(&mut flow, "d1");
        assert_ok!(flow.handle_answer_select("d2-q1", "d2-q1-a0"));

        let receipt = flow.submit(&["d1".to_string()], &catalog).await.unwrap();
        assert_eq!(receipt.assessment_id, "assessment-1");

        let submitted = catalog.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].len(), 5);
        assert_eq!(submitted[0][0].question_id, "d1-q1");

        assert_eq!(flow.state("d1"), DomainState::Unanswered);
        assert_eq!(flow.state("d2"), DomainState::InProgress);
        assert!(!flow.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_responses() {
        let catalog = FakeCatalog::new().failing();
        let mut flow = AssessmentFlow::new();
        flow.load_domain("d1", five_questions("d1"));
        answer_all(&mut flow, "d1");

        let err = flow.submit(&["d1".to_string()], &catalog).await.unwrap_err();
        assert!(matches!(err, FlowError::Api(_)));
        assert!(flow.can_submit("d1"));
        assert!(!flow.is_submitting());
    }
}
