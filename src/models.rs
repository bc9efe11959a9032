//! Data models for the assessment client.
//!
//! This module contains the records exchanged with the assessment API
//! (catalog entities, responses, statistics) and the chart-ready shapes
//! the dashboard produces from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level grouping of the assessment taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Display order assigned by the API (already applied to `GET /domains`).
    #[serde(default)]
    pub order: i64,
}

/// Second level of the taxonomy; belongs to exactly one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subdomain {
    pub id: String,
    pub domain_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Third level of the taxonomy; belongs to exactly one subdomain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub subdomain_id: String,
    pub name: String,
    #[serde(default)]
    pub definition: String,
}

/// Narrowest level of the taxonomy; belongs to exactly one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub control_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One selectable option for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub answer_text: String,
    /// Score awarded when this answer is selected (0-5).
    pub score_value: f64,
}

/// Control name and definition as embedded in a question payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub definition: String,
}

/// A survey question, with its position in the taxonomy resolved by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub domain_id: String,
    #[serde(default)]
    pub subdomain_id: String,
    #[serde(default)]
    pub control_id: String,
    #[serde(default)]
    pub metric_id: String,
    /// Subdomain name.
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub control: ControlInfo,
    /// Metric name.
    #[serde(default)]
    pub metric: String,
    pub question_text: String,
    pub answers: Vec<Answer>,
}

impl Question {
    /// Look up one of this question's answers by id.
    pub fn answer(&self, answer_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }
}

/// A user's selection for one question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    pub question_id: String,
    pub selected_answer_id: String,
}

/// Average score of one domain within an assessment, computed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain_id: String,
    pub domain_name: String,
    pub average_score: f64,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
}

/// Average score of one control within an assessment, computed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlScore {
    pub control_id: String,
    pub control_name: String,
    #[serde(default)]
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: String,
    pub average_score: f64,
    pub total_questions: u32,
}

/// Precomputed scores of one submitted assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentStats {
    #[serde(default)]
    pub overall_average: f64,
    #[serde(default)]
    pub total_responses: u32,
    #[serde(default)]
    pub domains_completed: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize_option"
    )]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub domain_scores: Vec<DomainScore>,
    #[serde(default)]
    pub control_performance: Vec<ControlScore>,
    #[serde(default)]
    pub top_strengths: Vec<DomainScore>,
    #[serde(default)]
    pub focus_areas: Vec<DomainScore>,
}

impl AssessmentStats {
    /// Upstream score for a control, if the assessment touched it.
    pub fn control_score(&self, control_id: &str) -> Option<&ControlScore> {
        self.control_performance
            .iter()
            .find(|c| c.control_id == control_id)
    }
}

/// One bar of a dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub score: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Answer progress of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Progress {
    /// Build progress from counts; `answered` is clamped to `total`.
    pub fn new(answered: usize, total: usize) -> Self {
        let answered = answered.min(total);
        let percentage = if total == 0 {
            0.0
        } else {
            100.0 * answered as f64 / total as f64
        };
        Self {
            answered,
            total,
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.0}%)",
            self.answered, self.total, self.percentage
        )
    }
}

/// Body of `POST /assessments/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub responses: Vec<Response>,
}

/// Acknowledgement of a stored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub assessment_id: String,
    #[serde(default)]
    pub message: String,
}

/// Status of a stored assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentStatus::InProgress => write!(f, "in progress"),
            AssessmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A stored assessment listed by `GET /assessments/my-assessments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssessment {
    pub id: String,
    pub user_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub submission_date: DateTime<Utc>,
    pub status: AssessmentStatus,
}

/// Role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Whether an account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Blocked,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// The signed-in user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// An account as listed by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub organization_name: String,
    pub email: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Profile of a new account. The password travels separately and is
/// added to the request body by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_email: Option<String>,
    pub designation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

/// Response of `POST /admin/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedUser {
    #[serde(default)]
    pub message: String,
    pub user: UserRecord,
}

/// Acknowledgement returned by the update and delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// Account counts by role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: u64,
    pub admin_users: u64,
    pub regular_users: u64,
}

/// Platform-wide submission counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionStats {
    pub total_assessments: u64,
    pub total_responses: u64,
    pub average_responses_per_assessment: f64,
}

/// Per-user activity line of the platform statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub organization: String,
    pub assessment_count: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub latest_assessment: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: AccountStatus,
}

/// A recent submission with the submitting user resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentAssessment {
    pub id: String,
    pub user_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
}

/// Response of `GET /admin/platform-stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformStats {
    pub user_stats: UserStats,
    pub assessment_stats: SubmissionStats,
    #[serde(default)]
    pub recent_assessments: Vec<RecentAssessment>,
    #[serde(default)]
    pub user_activities: Vec<UserActivity>,
}

/// Response of `GET /admin/content-stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStats {
    pub domains: u64,
    pub subdomains: u64,
    pub controls: u64,
    pub metrics: u64,
    pub questions: u64,
}

/// Timestamps as the API sends them: RFC 3339, or ISO 8601 without an
/// offset, which is read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(value, NAIVE_FORMAT).map(|dt| dt.and_utc()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse(&value).map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", value, e)))
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) => parse(&value)
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", value, e))),
            None => Ok(None),
        }
    }
}
