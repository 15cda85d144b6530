use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

use crate::artifacts::ModelArtifacts;
use crate::types::{
    ClassificationData, ClassificationRequest, ClassificationResponse, ModelKind, Usage,
};
use crate::vectorizer::Transformed;

#[async_trait]
pub trait Engine {
    async fn classify(&self, request: ClassificationRequest) -> Result<ClassificationResponse>;
}

/// Scores text with the shared TF-IDF artifacts.
#[derive(Clone)]
pub struct TfidfEngine {
    artifacts: Arc<ModelArtifacts>,
}

struct Scored {
    data: ClassificationData,
    tokens: usize,
    known: usize,
}

impl TfidfEngine {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &Arc<ModelArtifacts> {
        &self.artifacts
    }

    fn score(artifacts: &ModelArtifacts, model: ModelKind, index: usize, text: &str) -> Scored {
        let vectorizer = artifacts.vectorizer();
        let Transformed {
            features,
            tokens,
            known,
        } = vectorizer.transform(text);

        let classifier = artifacts.classifier(model);
        let probs = classifier.predict_proba(&features);
        let label = classifier.predict(&features);
        let confidence = probs[label.class_index()];

        tracing::debug!(
            index,
            nnz = features.nnz(),
            label = label.as_str(),
            confidence,
            "Scored input"
        );

        Scored {
            data: ClassificationData {
                index,
                label,
                confidence,
                probs: probs.to_vec(),
                num_classes: probs.len(),
            },
            tokens,
            known,
        }
    }
}

#[async_trait]
impl Engine for TfidfEngine {
    #[tracing::instrument(skip(self, request), fields(input_count = request.input.len(), model = %request.model))]
    async fn classify(&self, request: ClassificationRequest) -> Result<ClassificationResponse> {
        if let Some(index) = request.first_blank_input() {
            bail!("input {index} is empty");
        }

        let model = request.model;
        let artifacts = Arc::clone(&self.artifacts);
        let input = request.input;
        let scored = tokio::task::spawn_blocking(move || {
            input
                .iter()
                .enumerate()
                .map(|(index, text)| Self::score(&artifacts, model, index, text))
                .collect::<Vec<_>>()
        })
        .await?;

        let mut usage = Usage::default();
        let mut data = Vec::with_capacity(scored.len());
        for s in scored {
            usage.prompt_tokens += s.tokens as u32;
            usage.known_tokens += s.known as u32;
            counter!(
                "predictions_total",
                "model" => model.id(),
                "label" => s.data.label.as_str()
            )
            .increment(1);
            data.push(s.data);
        }

        Ok(ClassificationResponse {
            id: format!("classify-{}", Uuid::new_v4().simple()),
            object: "list".to_string(),
            created: Utc::now().timestamp(),
            model,
            data,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::fixture_artifacts;
    use crate::types::Label;

    async fn engine() -> TfidfEngine {
        TfidfEngine::new(Arc::new(fixture_artifacts().await))
    }

    #[tokio::test]
    async fn test_moon_cheese_is_fake_under_naive_bayes() {
        let engine = engine().await;
        let response = engine
            .classify(ClassificationRequest::single(
                ModelKind::NaiveBayes,
                "Scientists confirm the moon is made of cheese",
            ))
            .await
            .unwrap();

        let (label, confidence) = response.first().unwrap();
        assert_eq!(label, Label::Fake);
        assert!(confidence > 0.5 && confidence <= 1.0);
        assert_eq!(response.usage.prompt_tokens, 8);
        assert_eq!(response.usage.known_tokens, 5);
    }

    #[tokio::test]
    async fn test_wire_report_is_real_under_both_models() {
        let engine = engine().await;
        for model in ModelKind::ALL {
            let response = engine
                .classify(ClassificationRequest::single(
                    model,
                    "Reuters: the minister said the economy grew two percent",
                ))
                .await
                .unwrap();
            let (label, confidence) = response.first().unwrap();
            assert_eq!(label, Label::Real, "{model}");
            assert!(confidence > 0.5 && confidence <= 1.0);
        }
    }

    #[tokio::test]
    async fn test_confidence_is_probability_of_predicted_class() {
        let engine = engine().await;
        for text in ["Shocking miracle cure", "Government report", "nothing known here"] {
            for model in ModelKind::ALL {
                let response = engine
                    .classify(ClassificationRequest::single(model, text))
                    .await
                    .unwrap();
                let data = &response.data[0];
                assert_eq!(data.num_classes, 2);
                assert!((data.probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
                assert_eq!(data.confidence, data.probs[data.label.class_index()]);
                assert!((0.0..=1.0).contains(&data.confidence));
            }
        }
    }

    #[tokio::test]
    async fn test_repeated_submissions_are_deterministic() {
        let engine = engine().await;
        let text = "Secret government report on aliens";
        let first = engine
            .classify(ClassificationRequest::single(ModelKind::LogisticRegression, text))
            .await
            .unwrap();
        let second = engine
            .classify(ClassificationRequest::single(ModelKind::LogisticRegression, text))
            .await
            .unwrap();
        assert_eq!(first.first(), second.first());
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let engine = engine().await;
        let response = engine
            .classify(ClassificationRequest {
                model: ModelKind::LogisticRegression,
                input: vec!["moon hoax".into(), "official election".into()],
            })
            .await
            .unwrap();
        assert_eq!(response.object, "list");
        assert_eq!(response.data[0].index, 0);
        assert_eq!(response.data[0].label, Label::Fake);
        assert_eq!(response.data[1].index, 1);
        assert_eq!(response.data[1].label, Label::Real);
    }

    #[tokio::test]
    async fn test_blank_input_is_refused() {
        let engine = engine().await;
        let err = engine
            .classify(ClassificationRequest::single(ModelKind::NaiveBayes, "  \n "))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
