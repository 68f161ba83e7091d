//! GitHub REST v3 implementation of the upnotify [`IssueTracker`] interface.
//!
//! One `reqwest::Client` per `GithubClient`, bearer-token auth when a token
//! is configured, and a fixed per-call timeout. 404 responses map to
//! `UpnotifyError::NotFound` so the resolver can tell a missing object from
//! a service failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use libupnotify_core::error::UpnotifyError;
use libupnotify_core::tracker::IssueTracker;
use libupnotify_core::types::{TrackerIssue, TrackerRepo};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("upnotify/", env!("CARGO_PKG_VERSION"));
const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: usize = 100;

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client against `api_url` (e.g. [`DEFAULT_API_URL`]).
    ///
    /// A missing token is allowed; unauthenticated reads work for public
    /// repositories but are rate limited aggressively.
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self, UpnotifyError> {
        let http = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpnotifyError::Internal(format!("http client: {e}")))?;
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            api_url,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.api_url, path))
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    /// Send a request, mapping 404 to `NotFound` and every other
    /// non-success status to `Api` with the response text attached.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, UpnotifyError> {
        let response = request
            .send()
            .await
            .map_err(|e| UpnotifyError::Api(format!("{what}: {e}")))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(UpnotifyError::NotFound(what.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UpnotifyError::Api(format!("{what}: HTTP {status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn get_repo(&self, full_name: &str) -> Result<TrackerRepo, UpnotifyError> {
        let what = format!("repository {full_name}");
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{full_name}")), &what)
            .await?;
        response
            .json::<TrackerRepo>()
            .await
            .map_err(|e| UpnotifyError::Api(format!("{what}: {e}")))
    }

    async fn get_issue(
        &self,
        repo: &TrackerRepo,
        number: u64,
    ) -> Result<TrackerIssue, UpnotifyError> {
        let what = format!("issue {}#{number}", repo.full_name);
        let response = self
            .send(
                self.request(
                    Method::GET,
                    &format!("/repos/{}/issues/{number}", repo.full_name),
                ),
                &what,
            )
            .await?;
        response
            .json::<TrackerIssue>()
            .await
            .map_err(|e| UpnotifyError::Api(format!("{what}: {e}")))
    }

    async fn list_issues(&self, repo: &TrackerRepo) -> Result<Vec<TrackerIssue>, UpnotifyError> {
        let mut issues = Vec::new();
        let mut page = 1u32;
        loop {
            let what = format!("issues of {} (page {page})", repo.full_name);
            let path = format!(
                "/repos/{}/issues?state=open&per_page={PAGE_SIZE}&page={page}",
                repo.full_name
            );
            let response = self.send(self.request(Method::GET, &path), &what).await?;
            let batch: Vec<TrackerIssue> = response
                .json()
                .await
                .map_err(|e| UpnotifyError::Api(format!("{what}: {e}")))?;
            let last_page = batch.len() < PAGE_SIZE;
            issues.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }
        debug!(repo = %repo.full_name, count = issues.len(), "listed open issues");
        Ok(issues)
    }

    async fn create_issue(
        &self,
        repo: &TrackerRepo,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<TrackerIssue, UpnotifyError> {
        let what = format!("create issue in {}", repo.full_name);
        let response = self
            .send(
                self.request(Method::POST, &format!("/repos/{}/issues", repo.full_name))
                    .json(&serde_json::json!({
                        "title": title,
                        "body": body,
                        "labels": labels,
                    })),
                &what,
            )
            .await?;
        response
            .json::<TrackerIssue>()
            .await
            .map_err(|e| UpnotifyError::Api(format!("{what}: {e}")))
    }

    async fn edit_issue(
        &self,
        repo: &TrackerRepo,
        number: u64,
        body: &str,
    ) -> Result<(), UpnotifyError> {
        let what = format!("edit issue {}#{number}", repo.full_name);
        self.send(
            self.request(
                Method::PATCH,
                &format!("/repos/{}/issues/{number}", repo.full_name),
            )
            .json(&serde_json::json!({ "body": body })),
            &what,
        )
        .await?;
        Ok(())
    }
}
