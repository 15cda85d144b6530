use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two loaded classifiers handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    NaiveBayes,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::NaiveBayes];

    pub fn id(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::NaiveBayes => "naive_bayes",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::NaiveBayes => "Naive Bayes",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    /// Accepts both the id (`naive_bayes`) and the display name (`Naive Bayes`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| {
                kind.id().eq_ignore_ascii_case(s.trim())
                    || kind.display_name().eq_ignore_ascii_case(s.trim())
            })
            .ok_or_else(|| format!("unknown model '{s}', expected logistic_regression or naive_bayes"))
    }
}

/// Class encoding used by the fitted artifacts: 0 = real, 1 = fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Real = 0,
    Fake = 1,
}

impl Label {
    pub fn class_index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Real => "real",
            Label::Fake => "fake",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Label::Real => "Real News",
            Label::Fake => "Fake News",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationRequest {
    pub model: ModelKind,
    pub input: Vec<String>,
}

impl ClassificationRequest {
    pub fn single(model: ModelKind, text: impl Into<String>) -> Self {
        Self {
            model,
            input: vec![text.into()],
        }
    }

    /// Index of the first input that is empty or whitespace only.
    pub fn first_blank_input(&self) -> Option<usize> {
        self.input.iter().position(|text| text.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: ModelKind,
    pub data: Vec<ClassificationData>,
    pub usage: Usage,
}

impl ClassificationResponse {
    /// The first prediction, as shown on the demo page.
    pub fn first(&self) -> Option<(Label, f64)> {
        self.data.first().map(|d| (d.label, d.confidence))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationData {
    pub index: usize,
    pub label: Label,
    /// Probability of `label`, not of the fake class.
    pub confidence: f64,
    pub probs: Vec<f64>,
    pub num_classes: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct Usage {
    /// Tokens produced by the vectorizer's tokenizer.
    pub prompt_tokens: u32,
    /// Tokens (or n-grams) found in the fitted vocabulary.
    pub known_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: ModelKind,
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parses_ids_and_display_names() {
        assert_eq!("naive_bayes".parse::<ModelKind>().unwrap(), ModelKind::NaiveBayes);
        assert_eq!(
            "Logistic Regression".parse::<ModelKind>().unwrap(),
            ModelKind::LogisticRegression
        );
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_serde_uses_snake_case() {
        let kind: ModelKind = serde_json::from_str("\"logistic_regression\"").unwrap();
        assert_eq!(kind, ModelKind::LogisticRegression);
        assert_eq!(serde_json::to_string(&ModelKind::NaiveBayes).unwrap(), "\"naive_bayes\"");
    }

    #[test]
    fn test_label_class_encoding() {
        assert_eq!(Label::Real.class_index(), 0);
        assert_eq!(Label::Fake.class_index(), 1);
        assert_eq!(serde_json::to_string(&Label::Fake).unwrap(), "\"fake\"");
    }

    #[test]
    fn test_first_blank_input() {
        let request = ClassificationRequest {
            model: ModelKind::NaiveBayes,
            input: vec!["headline".into(), "   \n\t".into()],
        };
        assert_eq!(request.first_blank_input(), Some(1));
        assert_eq!(
            ClassificationRequest::single(ModelKind::NaiveBayes, "ok").first_blank_input(),
            None
        );
    }
}
