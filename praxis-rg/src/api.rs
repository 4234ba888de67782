//! HTTP client for the Module Access engine
//!
//! Bearer-authenticated reqwest wrapper around the praxis-ma endpoints
//! consumed by portal UIs: progress fetch, submission, lesson completion
//! and the access check.

use praxis_common::api::types::{
    AckResponse, AssignmentInfo, CanAccessResponse, ErrorResponse, MarkLessonCompleteRequest,
    ProgressResponse, SubmitAssignmentRequest,
};
use thiserror::Error;
use uuid::Uuid;

/// Client-side error for engine calls
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, TLS)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Engine returned a 4xx/5xx with a `{message}` body
    #[error("{message}")]
    Api { status: u16, message: String },
}

/// Bearer-authenticated client for one principal
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client against an engine base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a response into T, mapping error bodies to ClientError::Api
    async fn handle<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            // Engine errors always carry {message}; fall back to the
            // status text for anything that doesn't parse
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            };
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// GET /can-access - authorization check for a module
    pub async fn can_access(
        &self,
        course_id: Uuid,
        module_index: u32,
    ) -> Result<CanAccessResponse, ClientError> {
        let response = self
            .http
            .get(self.url("/can-access"))
            .bearer_auth(&self.token)
            .query(&[
                ("course_id", course_id.to_string()),
                ("module_index", module_index.to_string()),
            ])
            .send()
            .await?;
        Self::handle(response).await
    }

    /// GET /progress/:student_id - progress and submissions
    pub async fn fetch_progress(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<ProgressResponse, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/progress/{}", student_id)))
            .bearer_auth(&self.token)
            .query(&[("course_id", course_id.to_string())])
            .send()
            .await?;
        Self::handle(response).await
    }

    /// POST /submit-assignment - create a pending submission
    pub async fn submit_assignment(
        &self,
        request: &SubmitAssignmentRequest,
    ) -> Result<AssignmentInfo, ClientError> {
        let response = self
            .http
            .post(self.url("/submit-assignment"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// POST /mark-lesson-complete - record a lesson completion
    pub async fn mark_lesson_complete(
        &self,
        request: &MarkLessonCompleteRequest,
    ) -> Result<AckResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/mark-lesson-complete"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        Self::handle(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path() {
        let client = ApiClient::new("http://localhost:5750", "token");
        assert_eq!(client.url("/can-access"), "http://localhost:5750/can-access");
    }

    #[test]
    fn test_api_error_displays_message() {
        let err = ClientError::Api {
            status: 403,
            message: "Module 2 is locked".to_string(),
        };
        assert_eq!(err.to_string(), "Module 2 is locked");
    }
}
