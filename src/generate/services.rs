use base64::Engine;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use super::dto::GenerationRequest;
use crate::gemini::types::{Content, GenerateContentRequest, GenerationConfig, Modality, Part};
use crate::gemini::GeminiError;
use crate::state::AppState;
use crate::validation::BASE64_LENIENT;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Upstream(#[from] GeminiError),
    #[error("model returned no content")]
    NoResponse,
    #[error("model image part is not valid base64: {0}")]
    InvalidImage(#[from] base64::DecodeError),
    #[error("no image part in model response")]
    NoImage,
}

/// Returns the decoded bytes of the first part that carries inline data.
/// Text parts seen before it are logged and dropped.
pub fn first_image(parts: &[Part]) -> Result<Bytes, GenerateError> {
    for part in parts {
        if let Some(inline) = &part.inline_data {
            let bytes = BASE64_LENIENT.decode(&inline.data)?;
            return Ok(Bytes::from(bytes));
        }
        if let Some(text) = &part.text {
            info!(%text, "model text part");
        }
    }
    Err(GenerateError::NoImage)
}

pub async fn generate_image(
    st: &AppState,
    req: GenerationRequest,
) -> Result<Bytes, GenerateError> {
    let model = &st.config.gemini.generation_model;
    info!(%model, prompt_chars = req.prompt.len(), "generating image");

    let request = GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text(req.prompt)])],
        generation_config: Some(GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
        }),
    };
    let response = st.model.generate_content(model, &request).await?;
    let parts = response.first_parts().ok_or(GenerateError::NoResponse)?;
    first_image(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::types::InlineData;

    fn image(data: &str) -> Part {
        Part::inline(InlineData {
            mime_type: "image/png".into(),
            data: data.into(),
        })
    }

    #[test]
    fn skips_leading_text() {
        let parts = vec![Part::text("Aquí tienes tu imagen"), image("iVBORw0KGgo=")];
        let bytes = first_image(&parts).unwrap();
        assert_eq!(&bytes[..], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn first_image_wins() {
        let parts = vec![image("AQID"), image("BAUG")];
        assert_eq!(&first_image(&parts).unwrap()[..], &[1, 2, 3]);
    }

    #[test]
    fn text_only_is_no_image() {
        let parts = vec![Part::text("no puedo"), Part::text("lo siento")];
        assert!(matches!(first_image(&parts), Err(GenerateError::NoImage)));
        assert!(matches!(first_image(&[]), Err(GenerateError::NoImage)));
    }

    #[test]
    fn undecodable_image_is_an_error() {
        let parts = vec![image("%%%")];
        assert!(matches!(first_image(&parts), Err(GenerateError::InvalidImage(_))));
    }
}
