//! Remote fitness-tracking service client.
//!
//! The sync logic only depends on the two traits here. [`HevyClient`] is the
//! blocking HTTP implementation used by the binaries.

use crate::config::RemoteConfig;
use crate::{Error, RemoteRoutine, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// Submits routines to the remote service
pub trait RemoteRoutineClient {
    /// Create a routine, returning the decoded response body
    fn create(&self, routine: &RemoteRoutine) -> Result<Value>;
}

/// Reads workouts recorded on the remote service
pub trait RemoteWorkoutSource {
    /// Fetch one page of workouts, newest first
    fn get_workouts(&self, page: u32, page_size: u32) -> Result<Value>;
}

/// Blocking client for the Hevy API
#[derive(Clone, Debug)]
pub struct HevyClient {
    http: Client,
    base_url: String,
}

impl HevyClient {
    /// Build a client authenticating with `token`
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Config(format!("Invalid API token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from configuration, resolving the token from the environment first
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let token = config.resolve_token()?;
        Self::new(
            &config.base_url,
            &token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send()?;
        let status = response.status();
        tracing::debug!("Remote API responded with status {}", status);

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>()?)
    }
}

impl RemoteRoutineClient for HevyClient {
    fn create(&self, routine: &RemoteRoutine) -> Result<Value> {
        tracing::info!("Posting routine '{}' to {}", routine.title, self.base_url);
        self.send_json(self.http.post(self.url("/v1/routines")).json(routine))
    }
}

impl RemoteWorkoutSource for HevyClient {
    fn get_workouts(&self, page: u32, page_size: u32) -> Result<Value> {
        tracing::debug!("Fetching remote workouts page {} (size {})", page, page_size);
        let request = self
            .http
            .get(self.url("/v1/workouts"))
            .query(&[("page", page), ("pageSize", page_size)]);
        self.send_json(request)
    }
}
