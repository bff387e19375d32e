use crate::config::validate_model;
use crate::errors::IncidentError;
use crate::model::{decode_json_body, AdapterContext, ModelAdapter, ModelReply};
use crate::runtime::{HttpClient, HttpRequest};
use crate::types::ServiceKind;
use serde_json::{json, Value};

/// Text generation endpoint of a hosted foundation-model service.
pub struct GraniteAdapter;

impl GraniteAdapter {
    pub fn request_body(context: &AdapterContext, log: &str) -> Value {
        let mut body = json!({
            "model_id": context.model_id,
            "input": context.prompt_for(log),
            "parameters": {
                "decoding_method": context.decoding_method,
                "max_new_tokens": context.max_new_tokens,
            },
        });
        if let Some(project_id) = &context.project_id {
            body["project_id"] = json!(project_id);
        }
        body
    }

    pub fn url(context: &AdapterContext) -> String {
        format!(
            "{}/ml/v1/text/generation?version={}",
            context.endpoint, context.api_version
        )
    }
}

impl ModelAdapter for GraniteAdapter {
    fn backend(&self) -> ServiceKind {
        ServiceKind::Granite
    }

    fn submit(
        &self,
        http: &dyn HttpClient,
        context: &AdapterContext,
        log: &str,
    ) -> Result<ModelReply, IncidentError> {
        validate_model(&context.model_id)?;

        let response = http.post_json(HttpRequest {
            url: Self::url(context),
            bearer_token: context.api_key.clone(),
            body: Self::request_body(context, log),
            timeout: context.timeout,
        })?;
        let body = decode_json_body(self.backend(), &response)?;

        // An empty or missing result is still a reply; it classifies as Unknown.
        let text = body
            .get("results")
            .and_then(|results| results.get(0))
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(ModelReply::Text(text))
    }
}
