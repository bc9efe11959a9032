//! HTTP client for the assessment API.

use crate::api::error::{ApiError, Result};
use crate::api::CatalogService;
use crate::models::{
    AccountStatus, ApiMessage, AssessmentStats, ContentStats, Control, CreatedUser, Domain,
    LoginResponse, Metric, NewAccount, PlatformStats, Question, Response, Role,
    SubmissionReceipt, SubmissionRequest, Subdomain, UserAssessment, UserRecord,
};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Thin typed wrapper over the assessment API's JSON endpoints.
pub struct ApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sign in and open a session.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session> {
        let body = json!({ "email": email, "password": password.expose_secret() });
        let response: LoginResponse = self
            .send(self.request(Method::POST, "auth/login", None).json(&body))
            .await?;
        Ok(Session::from_login(response))
    }

    /// Create a regular account and open a session for it.
    pub async fn register(&self, account: &NewAccount, password: &SecretString) -> Result<Session> {
        let body = account_body(account, password, None)?;
        let response: LoginResponse = self
            .send_json(Method::POST, "auth/register", None, &body)
            .await?;
        Ok(Session::from_login(response))
    }

    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.get("domains", None).await
    }

    pub async fn domain_questions(&self, domain_id: &str) -> Result<Vec<Question>> {
        self.get(&format!("domains/{}/questions", domain_id), None)
            .await
    }

    pub async fn list_subdomains(&self, session: &Session) -> Result<Vec<Subdomain>> {
        self.get("admin/subdomains", Some(session)).await
    }

    pub async fn list_controls(&self, session: &Session) -> Result<Vec<Control>> {
        self.get("admin/controls", Some(session)).await
    }

    pub async fn list_metrics(&self, session: &Session) -> Result<Vec<Metric>> {
        self.get("admin/metrics", Some(session)).await
    }

    pub async fn assessment_stats(
        &self,
        session: &Session,
        assessment_id: &str,
    ) -> Result<AssessmentStats> {
        self.get(&format!("dashboard/stats/{}", assessment_id), Some(session))
            .await
    }

    pub async fn submit_assessment(
        &self,
        session: &Session,
        responses: &[Response],
    ) -> Result<SubmissionReceipt> {
        let body = SubmissionRequest {
            responses: responses.to_vec(),
        };
        self.send_json(Method::POST, "assessments/submit", Some(session), &body)
            .await
    }

    /// Assessments of the signed-in user, newest first.
    pub async fn my_assessments(&self, session: &Session) -> Result<Vec<UserAssessment>> {
        self.get("assessments/my-assessments", Some(session)).await
    }

    pub async fn platform_stats(&self, session: &Session) -> Result<PlatformStats> {
        self.get("admin/platform-stats", Some(session)).await
    }

    pub async fn content_stats(&self, session: &Session) -> Result<ContentStats> {
        self.get("admin/content-stats", Some(session)).await
    }

    pub async fn list_users(&self, session: &Session) -> Result<Vec<UserRecord>> {
        self.get("admin/users", Some(session)).await
    }

    /// Create an account with the given role.
    pub async fn create_user(
        &self,
        session: &Session,
        account: &NewAccount,
        password: &SecretString,
        role: Role,
    ) -> Result<UserRecord> {
        let body = account_body(account, password, Some(role))?;
        let created: CreatedUser = self
            .send_json(Method::POST, "admin/users", Some(session), &body)
            .await?;
        Ok(created.user)
    }

    /// Block or reactivate an account.
    pub async fn set_user_status(
        &self,
        session: &Session,
        user_id: &str,
        status: AccountStatus,
    ) -> Result<ApiMessage> {
        self.send_json(
            Method::PUT,
            &format!("admin/users/{}", user_id),
            Some(session),
            &json!({ "status": status }),
        )
        .await
    }

    pub async fn delete_user(&self, session: &Session, user_id: &str) -> Result<ApiMessage> {
        self.send(self.request(
            Method::DELETE,
            &format!("admin/users/{}", user_id),
            Some(session),
        ))
        .await
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.http_client.request(method, self.url(path));
        match session {
            Some(session) => builder.header(reqwest::header::AUTHORIZATION, session.bearer()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, session: Option<&Session>) -> Result<T> {
        self.send(self.request(Method::GET, path, session)).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(method, path, session).json(body))
            .await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            ApiError::Connect {
                url: self.config.base_url.clone(),
            }
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

/// JSON body of the account-creation endpoints.
fn account_body(
    account: &NewAccount,
    password: &SecretString,
    role: Option<Role>,
) -> Result<serde_json::Value> {
    let mut body = serde_json::to_value(account)
        .map_err(|e| ApiError::Request(format!("Failed to encode account: {}", e)))?;
    body["password"] = json!(password.expose_secret());
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    Ok(body)
}

/// [`CatalogService`] over an [`ApiClient`] for one signed-in session.
pub struct SessionCatalog<'a> {
    client: &'a ApiClient,
    session: &'a Session,
}

impl<'a> SessionCatalog<'a> {
    pub fn new(client: &'a ApiClient, session: &'a Session) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl<'a> CatalogService for SessionCatalog<'a> {
    async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.client.list_domains().await
    }

    async fn domain_questions(&self, domain_id: &str) -> Result<Vec<Question>> {
        self.client.domain_questions(domain_id).await
    }

    async fn list_subdomains(&self) -> Result<Vec<Subdomain>> {
        self.client.list_subdomains(self.session).await
    }

    async fn list_controls(&self) -> Result<Vec<Control>> {
        self.client.list_controls(self.session).await
    }

    async fn list_metrics(&self) -> Result<Vec<Metric>> {
        self.client.list_metrics(self.session).await
    }

    async fn assessment_stats(&self, assessment_id: &str) -> Result<AssessmentStats> {
        self.client
            .assessment_stats(self.session, assessment_id)
            .await
    }

    async fn submit_assessment(&self, responses: &[Response]) -> Result<SubmissionReceipt> {
        self.client
            .submit_assessment(self.session, responses)
            .await
    }
}
