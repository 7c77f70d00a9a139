use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gemini::types::InlineData;
use crate::validation::{Checker, Issue, Validate, BASE64_LENIENT};

/// Body of `POST /api/image-analyze`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub inline_data: InlineData,
}

impl Validate for AnalysisRequest {
    fn validate(value: &Value) -> Result<Self, Vec<Issue>> {
        let mut c = Checker::new();
        let inline = c.object(Some(value), &[]).and_then(|root| {
            c.strict(root, &["inlineData"], &[]);
            c.object(root.get("inlineData"), &["inlineData"])
        });

        let parsed = inline.and_then(|inline| {
            let mime_type = c.string(inline.get("mimeType"), &["inlineData", "mimeType"]);
            let data = c.string(inline.get("data"), &["inlineData", "data"]);
            if let Some(d) = data {
                if BASE64_LENIENT.decode(d).is_err() {
                    c.push(Issue::invalid_format(
                        &["inlineData", "data"],
                        "base64",
                        "Invalid base64-encoded string",
                    ));
                }
            }
            Some(InlineData {
                mime_type: mime_type?.to_string(),
                data: data?.to_string(),
            })
        });

        c.finish(parsed.map(|inline_data| AnalysisRequest { inline_data }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
    pub fiber: String,
    pub sugar: String,
    pub sodium: String,
    pub cholesterol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodAnalysis {
    pub identified_food: String,
    pub portion_size: String,
    pub recognized_serving_size: String,
    pub nutrition_facts_per_portion: NutritionFacts,
    #[serde(rename = "nutritionFactsPer100g")]
    pub nutrition_facts_per_100g: NutritionFacts,
    pub additional_notes: Vec<String>,
}

/// Shape the model is instructed to answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub food_analysis: FoodAnalysis,
}

/// `{ ok, error, message }` / `{ ok, error, analysis }` envelope.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub error: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl AnalyzeResponse {
    pub fn success(analysis: AnalysisResult) -> Self {
        Self {
            ok: true,
            error: Value::Null,
            message: None,
            analysis: Some(analysis),
        }
    }

    pub fn failure(error: Value, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error,
            message: Some(message.into()),
            analysis: None,
        }
    }
}
