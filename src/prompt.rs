use anyhow::Context;

const BUILTIN_TEMPLATE: &str = include_str!("../prompts/food_analysis.v1.txt");
const BUILTIN_VERSION: &str = "v1";

/// Instruction text sent next to the image on every analysis call.
///
/// The text prescribes the JSON shape the model answers with, so any edit to
/// it changes what `/api/image-analyze` returns. Edits get a new version label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub version: String,
    pub text: String,
}

impl AnalysisPrompt {
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_VERSION.into(),
            text: BUILTIN_TEMPLATE.trim_end().to_string(),
        }
    }

    pub fn from_file(path: &str, version: String) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read analysis prompt {}", path))?;
        let text = text.trim_end().to_string();
        anyhow::ensure!(!text.is_empty(), "analysis prompt {} is empty", path);
        Ok(Self { version, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_template_describes_the_schema() {
        let p = AnalysisPrompt::builtin();
        assert_eq!(p.version, "v1");
        assert!(p.text.starts_with("Analiza esta imagen de alimento"));
        for key in [
            "\"foodAnalysis\"",
            "\"identifiedFood\"",
            "\"portionSize\"",
            "\"recognizedServingSize\"",
            "\"nutritionFactsPerPortion\"",
            "\"nutritionFactsPer100g\"",
            "\"additionalNotes\"",
            "\"cholesterol\"",
        ] {
            assert!(p.text.contains(key), "missing {}", key);
        }
        assert!(p.text.contains("sin ningún formato de Markdown"));
        assert!(!p.text.ends_with('\n'));
    }

    #[test]
    fn from_file_reads_and_labels() {
        let path = std::env::temp_dir().join(format!("nutrilens-prompt-{}.txt", std::process::id()));
        std::fs::write(&path, "Describe the dish as JSON.\n\n").unwrap();
        let p = AnalysisPrompt::from_file(path.to_str().unwrap(), "v2".into()).unwrap();
        assert_eq!(p.version, "v2");
        assert_eq!(p.text, "Describe the dish as JSON.");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn from_file_rejects_missing_or_blank() {
        assert!(AnalysisPrompt::from_file("/definitely/not/here.txt", "x".into()).is_err());

        let path = std::env::temp_dir().join(format!("nutrilens-blank-{}.txt", std::process::id()));
        std::fs::write(&path, "  \n").unwrap();
        let err = AnalysisPrompt::from_file(path.to_str().unwrap(), "x".into()).unwrap_err();
        assert!(err.to_string().contains("empty"));
        std::fs::remove_file(&path).ok();
    }
}
