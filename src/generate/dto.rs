use serde::Serialize;
use serde_json::Value;

use crate::validation::{Checker, Issue, Validate};

/// Body of `POST /api/image-generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl Validate for GenerationRequest {
    fn validate(value: &Value) -> Result<Self, Vec<Issue>> {
        let mut c = Checker::new();
        let prompt = c.object(Some(value), &[]).and_then(|root| {
            c.strict(root, &["prompt"], &[]);
            c.string(root.get("prompt"), &["prompt"])
        });
        c.finish(prompt.map(|p| GenerationRequest {
            prompt: p.to_string(),
        }))
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Vec<Issue>>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}
