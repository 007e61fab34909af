//! # GitHub Tracker Client
//!
//! The [`IssueTracker`] trait is the seam between the milestone policy
//! engine and the tracker backing it. [`GitHubClient`] implements it
//! against the GitHub REST API with rate-limit tracking and transparent
//! pagination; [`DryRunTracker`] wraps any implementation and turns every
//! mutation into a logged no-op.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::error::TrackerError;
use crate::models::{Comment, Issue, IssueEvent, SearchResults, User};

/// Page size used for every list/search call.
const PER_PAGE: usize = 100;

/// Abstract tracker the maintainer reconciles against.
///
/// All methods are keyed by `org`/`repo` plus the issue number (or the
/// tracker-global comment id for comment mutations). Implementations are
/// expected to resolve pagination themselves: list methods return the
/// complete history.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Login of the account the client authenticates as.
    async fn bot_identity(&self) -> Result<String, TrackerError>;

    /// All comments on an issue, oldest first.
    async fn list_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError>;

    /// All timeline events on an issue, oldest first.
    async fn list_events(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueEvent>, TrackerError>;

    /// All review comments on a pull request, oldest first.
    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError>;

    async fn add_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError>;

    /// Removing a label that is not present is not an error.
    async fn remove_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError>;

    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError>;

    async fn delete_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
    ) -> Result<(), TrackerError>;

    async fn edit_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), TrackerError>;

    /// Drop the issue from whatever milestone it is assigned to.
    async fn clear_milestone(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<(), TrackerError>;

    /// Open issues and pull requests assigned to the named milestone.
    async fn list_milestone_issues(
        &self,
        org: &str,
        repo: &str,
        milestone: &str,
    ) -> Result<Vec<Issue>, TrackerError>;
}

/// Error payload GitHub returns for non-success responses.
#[derive(Debug, Deserialize)]
struct GitHubApiError {
    message: String,
}

/// GitHub REST implementation of [`IssueTracker`].
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    bot_login: OnceCell<String>,
    rate_limit_remaining: AtomicI64,
    rate_limit_reset_epoch: AtomicI64,
}

impl GitHubClient {
    /// Create a client against `base_url` (usually `https://api.github.com`)
    /// with a bearer `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("shepherd-maintainer/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            bot_login: OnceCell::new(),
            // GitHub's default hourly quota; corrected from response headers.
            rate_limit_remaining: AtomicI64::new(5000),
            rate_limit_reset_epoch: AtomicI64::new(0),
        })
    }

    fn check_rate_limit(&self) -> Result<(), TrackerError> {
        if self.rate_limit_remaining.load(Ordering::Relaxed) > 0 {
            return Ok(());
        }
        let reset = self.rate_limit_reset_epoch.load(Ordering::Relaxed);
        let now = chrono::Utc::now().timestamp();
        if reset > now {
            #[allow(clippy::cast_sign_loss)]
            return Err(TrackerError::RateLimited {
                reset_in_secs: (reset - now) as u64,
            });
        }
        // Reset time has passed; let the next request refresh the counters.
        Ok(())
    }

    fn update_rate_limit(&self, response: &Response) {
        if let Some(remaining) = header_i64(response, "x-ratelimit-remaining") {
            self.rate_limit_remaining.store(remaining, Ordering::Relaxed);
        }
        if let Some(reset) = header_i64(response, "x-ratelimit-reset") {
            self.rate_limit_reset_epoch.store(reset, Ordering::Relaxed);
        }
    }

    /// Send a request, refresh rate-limit tracking, and map auth and
    /// rate-limit responses to their dedicated errors. Other statuses are
    /// returned for the caller to interpret.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, TrackerError> {
        self.check_rate_limit()?;

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        self.update_rate_limit(&response);

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(TrackerError::AuthenticationFailed),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
                if self.rate_limit_remaining.load(Ordering::Relaxed) <= 0 =>
            {
                let reset = self.rate_limit_reset_epoch.load(Ordering::Relaxed);
                let now = chrono::Utc::now().timestamp();
                #[allow(clippy::cast_sign_loss)]
                Err(TrackerError::RateLimited {
                    reset_in_secs: (reset - now).max(0) as u64,
                })
            }
            _ => Ok(response),
        }
    }

    /// Turn a non-success response into [`TrackerError::Api`], preferring
    /// the `message` field of GitHub's error payload over the raw body.
    async fn into_api_error(response: Response) -> TrackerError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubApiError>(&body)
            .map_or(body, |error| error.message);
        TrackerError::Api { status, message }
    }

    /// Decode a success body. A body that fails to parse is an API
    /// contract violation, not a transport failure, and maps to
    /// [`TrackerError::InvalidResponse`].
    async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|error| TrackerError::InvalidResponse(error.to_string()))
    }

    /// GET a paginated collection, following pages until a short page.
    async fn get_paged<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, TrackerError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let page_url = format!("{url}?per_page={PER_PAGE}&page={page}");
            let response = self.request(Method::GET, &page_url, None).await?;
            if !response.status().is_success() {
                return Err(Self::into_api_error(response).await);
            }
            let batch: Vec<T> = Self::decode_body(response).await?;
            let batch_len = batch.len();
            items.extend(batch);
            if batch_len < PER_PAGE {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Send a mutating request and accept any success status.
    async fn mutate(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), TrackerError> {
        let response = self.request(method, url, body).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::into_api_error(response).await)
        }
    }

    fn issue_url(&self, org: &str, repo: &str, number: u64) -> String {
        format!("{}/repos/{org}/{repo}/issues/{number}", self.base_url)
    }
}

fn header_i64(response: &Response, name: &str) -> Option<i64> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn bot_identity(&self) -> Result<String, TrackerError> {
        let login = self
            .bot_login
            .get_or_try_init(|| async {
                let url = format!("{}/user", self.base_url);
                let response = self.request(Method::GET, &url, None).await?;
                if !response.status().is_success() {
                    return Err(Self::into_api_error(response).await);
                }
                let user: User = Self::decode_body(response).await?;
                debug!(login = %user.login, "Resolved bot identity");
                Ok(user.login)
            })
            .await?;
        Ok(login.clone())
    }

    #[instrument(skip(self))]
    async fn list_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError> {
        let url = format!("{}/comments", self.issue_url(org, repo, number));
        self.get_paged(&url).await
    }

    #[instrument(skip(self))]
    async fn list_events(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueEvent>, TrackerError> {
        let url = format!("{}/events", self.issue_url(org, repo, number));
        self.get_paged(&url).await
    }

    #[instrument(skip(self))]
    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError> {
        let url = format!("{}/repos/{org}/{repo}/pulls/{number}/comments", self.base_url);
        self.get_paged(&url).await
    }

    #[instrument(skip(self))]
    async fn add_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/labels", self.issue_url(org, repo, number));
        let body = serde_json::json!({ "labels": [label] });
        self.mutate(Method::POST, &url, Some(body)).await?;
        info!(label = %label, "Added label to {org}/{repo}#{number}");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        let url = format!(
            "{}/labels/{}",
            self.issue_url(org, repo, number),
            urlencoding::encode(label)
        );
        let response = self.request(Method::DELETE, &url, None).await?;
        match response.status().as_u16() {
            200 | 204 => {
                info!(label = %label, "Removed label from {org}/{repo}#{number}");
                Ok(())
            }
            404 => {
                // Label doesn't exist, which is fine for removal
                debug!(label = %label, "Label not present on {org}/{repo}#{number} (already removed)");
                Ok(())
            }
            _ => Err(Self::into_api_error(response).await),
        }
    }

    #[instrument(skip(self, body))]
    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/comments", self.issue_url(org, repo, number));
        let payload = serde_json::json!({ "body": body });
        self.mutate(Method::POST, &url, Some(payload)).await?;
        info!("Created comment on {org}/{repo}#{number}");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/repos/{org}/{repo}/issues/comments/{comment_id}", self.base_url);
        let response = self.request(Method::DELETE, &url, None).await?;
        match response.status().as_u16() {
            200 | 204 => {
                info!("Deleted comment {comment_id} in {org}/{repo}");
                Ok(())
            }
            404 => {
                debug!("Comment {comment_id} in {org}/{repo} already gone");
                Ok(())
            }
            _ => Err(Self::into_api_error(response).await),
        }
    }

    #[instrument(skip(self, body))]
    async fn edit_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/repos/{org}/{repo}/issues/comments/{comment_id}", self.base_url);
        let payload = serde_json::json!({ "body": body });
        self.mutate(Method::PATCH, &url, Some(payload)).await
    }

    #[instrument(skip(self))]
    async fn clear_milestone(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<(), TrackerError> {
        let url = self.issue_url(org, repo, number);
        let body = serde_json::json!({ "milestone": null });
        self.mutate(Method::PATCH, &url, Some(body)).await?;
        info!("Cleared milestone on {org}/{repo}#{number}");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_milestone_issues(
        &self,
        org: &str,
        repo: &str,
        milestone: &str,
    ) -> Result<Vec<Issue>, TrackerError> {
        let query = format!(r#"repo:{org}/{repo} state:open milestone:"{milestone}""#);
        let encoded = urlencoding::encode(&query);

        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/search/issues?q={encoded}&per_page={PER_PAGE}&page={page}",
                self.base_url
            );
            let response = self.request(Method::GET, &url, None).await?;
            if !response.status().is_success() {
                return Err(Self::into_api_error(response).await);
            }
            let results: SearchResults = Self::decode_body(response).await?;
            let batch_len = results.items.len();
            items.extend(results.items);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        debug!(count = items.len(), milestone = %milestone, "Listed open milestone issues");
        Ok(items)
    }
}

/// Wrapper that forwards reads and logs mutations without performing them.
///
/// Mirrors how the sweep is expected to run by default: real API reads,
/// no writes.
pub struct DryRunTracker<T> {
    inner: T,
}

impl<T> DryRunTracker<T> {
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: IssueTracker> IssueTracker for DryRunTracker<T> {
    async fn bot_identity(&self) -> Result<String, TrackerError> {
        self.inner.bot_identity().await
    }

    async fn list_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError> {
        self.inner.list_comments(org, repo, number).await
    }

    async fn list_events(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueEvent>, TrackerError> {
        self.inner.list_events(org, repo, number).await
    }

    async fn list_review_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Comment>, TrackerError> {
        self.inner.list_review_comments(org, repo, number).await
    }

    async fn add_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        info!(label = %label, "Dry run: would add label to {org}/{repo}#{number}");
        Ok(())
    }

    async fn remove_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), TrackerError> {
        info!(label = %label, "Dry run: would remove label from {org}/{repo}#{number}");
        Ok(())
    }

    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), TrackerError> {
        info!(
            bytes = body.len(),
            "Dry run: would create comment on {org}/{repo}#{number}"
        );
        Ok(())
    }

    async fn delete_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
    ) -> Result<(), TrackerError> {
        info!("Dry run: would delete comment {comment_id} in {org}/{repo}");
        Ok(())
    }

    async fn edit_comment(
        &self,
        org: &str,
        repo: &str,
        comment_id: u64,
        _body: &str,
    ) -> Result<(), TrackerError> {
        info!("Dry run: would edit comment {comment_id} in {org}/{repo}");
        Ok(())
    }

    async fn clear_milestone(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<(), TrackerError> {
        info!("Dry run: would clear milestone on {org}/{repo}#{number}");
        Ok(())
    }

    async fn list_milestone_issues(
        &self,
        org: &str,
        repo: &str,
        milestone: &str,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.inner.list_milestone_issues(org, repo, milestone).await
    }
}
