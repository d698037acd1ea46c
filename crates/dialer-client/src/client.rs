//! The remote API client and its degraded continuations.

use crate::error::ClientError;
use crate::export;
use dialer_types::{
    AgentProfile, ExportFormat, Message, Organization, RoutedAgent, UserPreferences,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// The generic agent substituted when routing fails. Availability over
/// correctness: the user always reaches a call.
pub fn fallback_agent() -> RoutedAgent {
    RoutedAgent {
        agent: AgentProfile {
            name: "AI Assistant".to_string(),
            title: "Virtual Assistant".to_string(),
            department: "General Support".to_string(),
        },
        greeting: "Hello, how can I help you today?".to_string(),
        organization: Organization {
            name: "AI Assistant".to_string(),
            kind: "general".to_string(),
        },
    }
}

#[derive(Serialize)]
struct RouteRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    conversation_history: &'a [Message],
    personality: &'a str,
    user_preferences: &'a UserPreferences,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: String,
}

#[derive(Serialize)]
struct ExportRequest<'a> {
    conversation: &'a [Message],
    format: ExportFormat,
}

/// Client for the remote routing/chat/export API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client with a fixed request timeout applied to every
    /// call. `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Routes a call request to an agent persona.
    ///
    /// Never fails: any remote error (timeout included) substitutes the
    /// fixed [`fallback_agent`] and the caller proceeds to the call
    /// screen identically to the success path.
    pub async fn route_call(&self, message: &str) -> RoutedAgent {
        match self.try_route_call(message).await {
            Ok(routed) => routed,
            Err(e) => {
                warn!(error = %e, "routing call failed, using fallback agent");
                fallback_agent()
            }
        }
    }

    async fn try_route_call(&self, message: &str) -> Result<RoutedAgent, ClientError> {
        let response = self
            .http
            .post(self.url("/route-call"))
            .json(&RouteRequest { message })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Sends a user message and returns the assistant's reply text.
    ///
    /// Errors here are the caller's to absorb (the controller appends
    /// an inline apology instead of surfacing them).
    pub async fn chat(
        &self,
        message: &str,
        conversation_history: &[Message],
        personality: &str,
        user_preferences: &UserPreferences,
    ) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.url("/chat"))
            .json(&ChatRequest {
                message,
                conversation_history,
                personality,
                user_preferences,
            })
            .send()
            .await?
            .error_for_status()?;
        let body: ChatResponse = response.json().await?;
        Ok(body.message)
    }

    /// Exports a transcript through the remote endpoint, falling back
    /// to an identical local rendering if the remote call fails.
    pub async fn export_transcript(
        &self,
        conversation: &[Message],
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        match self.try_export(conversation, format).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                warn!(error = %e, format = %format, "remote export failed, rendering locally");
                Ok(export::render(conversation, format)?.into_bytes())
            }
        }
    }

    async fn try_export(
        &self,
        conversation: &[Message],
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .post(self.url("/transcript/export"))
            .json(&ExportRequest {
                conversation,
                format,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
