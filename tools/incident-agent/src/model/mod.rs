//! Adapters for the hosted model services a log line can be classified by.
//!
//! Each adapter owns one request/response shape. The classifier only sees the
//! [`ModelReply`] it produces, so free-text services and services that return a
//! ready-made label are interchangeable behind [`ModelAdapter`].

use crate::config::AppConfig;
use crate::errors::IncidentError;
use crate::runtime::{HttpClient, HttpResponse};
use crate::types::ServiceKind;
use serde_json::Value;
use std::time::Duration;

pub mod factory;
pub mod granite;
pub mod inference;
pub mod structured;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterContext {
    pub endpoint: String,
    pub model_id: String,
    pub project_id: Option<String>,
    pub api_version: String,
    pub api_key: Option<String>,
    pub decoding_method: String,
    pub max_new_tokens: u32,
    pub prompt_prefix: String,
    pub category_field: String,
    pub timeout: Option<Duration>,
}

impl AdapterContext {
    pub fn from_config(cfg: &AppConfig, api_key: Option<String>) -> Self {
        Self {
            endpoint: cfg.service.endpoint.trim_end_matches('/').to_string(),
            model_id: cfg.service.model_id.clone(),
            project_id: cfg.service.project_id.clone(),
            api_version: cfg.service.api_version.clone(),
            api_key,
            decoding_method: cfg.generation.decoding_method.clone(),
            max_new_tokens: cfg.generation.max_new_tokens,
            prompt_prefix: cfg.generation.prompt_prefix.clone(),
            category_field: cfg.service.category_field.clone(),
            timeout: (cfg.service.timeout_secs > 0)
                .then(|| Duration::from_secs(cfg.service.timeout_secs)),
        }
    }

    pub fn prompt_for(&self, log: &str) -> String {
        format!("{}{log}", self.prompt_prefix)
    }
}

/// What a service said about one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// Free text to be matched against the local keyword rules.
    Text(String),
    /// A category label chosen by the service itself.
    Category(String),
}

pub trait ModelAdapter: Send + Sync {
    fn backend(&self) -> ServiceKind;
    fn submit(
        &self,
        http: &dyn HttpClient,
        context: &AdapterContext,
        log: &str,
    ) -> Result<ModelReply, IncidentError>;
}

/// Rejects non-2xx responses and decodes the body as JSON.
pub(crate) fn decode_json_body(
    backend: ServiceKind,
    response: &HttpResponse,
) -> Result<Value, IncidentError> {
    if !response.is_success() {
        return Err(IncidentError::Service(format!(
            "{} returned status {}: {}",
            backend.as_str(),
            response.status,
            body_preview(&response.body)
        )));
    }
    serde_json::from_str(&response.body).map_err(|e| {
        IncidentError::Response(format!(
            "{} returned invalid json: {e}; body={}",
            backend.as_str(),
            body_preview(&response.body)
        ))
    })
}

fn body_preview(body: &str) -> String {
    body.chars().take(256).collect()
}

#[cfg(test)]
mod tests {
    use super::{decode_json_body, AdapterContext};
    use crate::config::AppConfig;
    use crate::runtime::HttpResponse;
    use crate::types::ServiceKind;
    use std::time::Duration;

    #[test]
    fn context_trims_trailing_slash_and_maps_timeout() {
        let mut cfg = AppConfig::default();
        cfg.service.endpoint = "https://models.example/".to_string();
        let ctx = AdapterContext::from_config(&cfg, None);
        assert_eq!(ctx.endpoint, "https://models.example");
        assert_eq!(ctx.timeout, Some(Duration::from_secs(30)));

        cfg.service.timeout_secs = 0;
        assert_eq!(AdapterContext::from_config(&cfg, None).timeout, None);
    }

    #[test]
    fn prompt_embeds_the_log_line() {
        let ctx = AdapterContext::from_config(&AppConfig::default(), None);
        assert_eq!(
            ctx.prompt_for("disk full"),
            "Classify this log: disk full"
        );
    }

    #[test]
    fn non_success_status_is_a_service_error() {
        let err = decode_json_body(
            ServiceKind::Granite,
            &HttpResponse {
                status: 401,
                body: "unauthorized".to_string(),
            },
        )
        .expect_err("must fail");
        let text = format!("{err}");
        assert!(text.contains("status 401"));
        assert!(text.contains("unauthorized"));
    }

    #[test]
    fn malformed_body_is_a_response_error() {
        let err = decode_json_body(
            ServiceKind::Inference,
            &HttpResponse {
                status: 200,
                body: "<html>".to_string(),
            },
        )
        .expect_err("must fail");
        assert!(format!("{err}").contains("invalid json"));
    }
}
