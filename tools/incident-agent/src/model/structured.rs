use crate::errors::IncidentError;
use crate::model::{decode_json_body, AdapterContext, ModelAdapter, ModelReply};
use crate::runtime::{HttpClient, HttpRequest};
use crate::types::ServiceKind;
use serde_json::{json, Value};

/// Classification service that answers with a category field directly.
pub struct StructuredAdapter;

impl ModelAdapter for StructuredAdapter {
    fn backend(&self) -> ServiceKind {
        ServiceKind::Structured
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
            body: json!({
                "log": log,
                "model": context.model_id,
            }),
            timeout: context.timeout,
        })?;
        let body = decode_json_body(self.backend(), &response)?;

        let label = body
            .get(&context.category_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                IncidentError::Response(format!(
                    "structured reply is missing `{}`",
                    context.category_field
                ))
            })?;
        Ok(ModelReply::Category(label.to_string()))
    }
}
