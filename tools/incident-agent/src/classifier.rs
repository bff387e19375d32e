use crate::logging::append_run_log;
use crate::model::{AdapterContext, ModelAdapter, ModelReply};
use crate::runtime::HttpClient;
use crate::types::Category;
use serde_json::json;
use std::sync::Arc;

/// Keyword rules in priority order; the first rule with a matching needle wins.
const KEYWORD_RULES: [(&[&str], Category); 3] = [
    (&["crash", "failure"], Category::Critical),
    (&["timeout", "latency"], Category::High),
    (&["memory leak", "slow"], Category::Medium),
];

pub fn classify_text(response_text: &str) -> Category {
    let lowered = response_text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Unknown)
}

pub fn category_for_reply(reply: &ModelReply) -> Category {
    match reply {
        ModelReply::Text(text) => classify_text(text),
        ModelReply::Category(label) => Category::parse_label(label),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    Classified { category: Category, reply: ModelReply },
    Failed { reason: String },
}

impl ClassificationOutcome {
    pub fn category(&self) -> Category {
        match self {
            Self::Classified { category, .. } => *category,
            Self::Failed { .. } => Category::Unknown,
        }
    }
}

pub struct Classifier {
    adapter: Arc<dyn ModelAdapter>,
    http: Arc<dyn HttpClient>,
    context: AdapterContext,
}

impl Classifier {
    pub fn new(
        adapter: Arc<dyn ModelAdapter>,
        http: Arc<dyn HttpClient>,
        context: AdapterContext,
    ) -> Self {
        Self {
            adapter,
            http,
            context,
        }
    }

    pub fn classify(&self, log: &str) -> ClassificationOutcome {
        append_run_log(
            "debug",
            "classify.request",
            json!({
                "backend": self.adapter.backend().as_str(),
                "log": log,
            }),
        );

        match self.adapter.submit(self.http.as_ref(), &self.context, log) {
            Ok(reply) => {
                let category = category_for_reply(&reply);
                append_run_log(
                    "info",
                    "classify.result",
                    json!({
                        "log": log,
                        "category": category.as_str(),
                        "reply": reply_text(&reply),
                    }),
                );
                ClassificationOutcome::Classified { category, reply }
            }
            Err(err) => {
                let reason = err.to_string();
                append_run_log(
                    "warn",
                    "classify.failed",
                    json!({
                        "log": log,
                        "reason": reason,
                    }),
                );
                ClassificationOutcome::Failed { reason }
            }
        }
    }
}

fn reply_text(reply: &ModelReply) -> &str {
    match reply {
        ModelReply::Text(text) | ModelReply::Category(text) => text,
    }
}
