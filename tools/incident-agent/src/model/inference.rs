use crate::errors::IncidentError;
use crate::model::{decode_json_body, AdapterContext, ModelAdapter, ModelReply};
use crate::runtime::{HttpClient, HttpRequest};
use crate::types::ServiceKind;
use serde_json::{json, Value};

/// Hosted text-generation inference endpoint (`{"inputs": ...}` in,
/// `generated_text` out).
pub struct InferenceAdapter;

impl InferenceAdapter {
    pub fn request_body(context: &AdapterContext, log: &str) -> Value {
        json!({
            "inputs": context.prompt_for(log),
            "parameters": {
                "max_new_tokens": context.max_new_tokens,
            },
        })
    }
}

impl ModelAdapter for InferenceAdapter {
    fn backend(&self) -> ServiceKind {
        ServiceKind::Inference
    }

    fn submit(
        &self,
        http: &dyn HttpClient,
        context: &AdapterContext,
        log: &str,
    ) -> Result<ModelReply, IncidentError> {
        let response = http.post_json(HttpRequest {
            url: context.endpoint.clone(),
            bearer_token: context.api_key.clone(),
            body: Self::request_body(context, log),
            timeout: context.timeout,
        })?;
        let body = decode_json_body(self.backend(), &response)?;

        let generated = match &body {
            Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
            Value::Object(_) => body.get("generated_text"),
            _ => None,
        };
        let text = generated.and_then(Value::as_str).ok_or_else(|| {
            IncidentError::Response("inference reply is missing generated_text".to_string())
        })?;
        Ok(ModelReply::Text(text.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::InferenceAdapter;
    use crate::config::AppConfig;
    use crate::model::{AdapterContext, ModelAdapter, ModelReply};
    use crate::runtime::FakeHttpClient;
    use serde_json::json;

    fn context() -> AdapterContext {
        let mut cfg = AppConfig::default();
        cfg.service.endpoint = "https://inference.test/models/gpt2".to_string();
        AdapterContext::from_config(&cfg, None)
    }

    #[test]
    fn accepts_list_and_object_replies() {
        let http = FakeHttpClient::default();
        http.push_json(200, json!([{"generated_text": "a timeout occurred"}]));
        http.push_json(200, json!({"generated_text": "slow response"}));

        let first = InferenceAdapter
            .submit(&http, &context(), "Database timeout")
            .expect("first");
        let second = InferenceAdapter
            .submit(&http, &context(), "Slow page")
            .expect("second");
        assert_eq!(first, ModelReply::Text("a timeout occurred".to_string()));
        assert_eq!(second, ModelReply::Text("slow response".to_string()));

        let request = &http.requests()[0];
        assert_eq!(request.url, "https://inference.test/models/gpt2");
        assert_eq!(request.bearer_token, None);
        assert_eq!(
            request.body["inputs"],
            json!("Classify this log: Database timeout")
        );
    }

    #[test]
    fn reply_without_generated_text_is_rejected() {
        let http = FakeHttpClient::default();
        http.push_json(200, json!({"error": "model loading"}));
        let err = InferenceAdapter
            .submit(&http, &context(), "log")
            .expect_err("must fail");
        assert!(format!("{err}").contains("generated_text"));
    }
}
