use anyhow::{Result, bail};
use serde::Deserialize;

use crate::types::Label;
use crate::vectorizer::SparseVector;

/// A fitted binary classifier over TF-IDF features.
pub trait Classifier: Send + Sync {
    /// `[P(real), P(fake)]`.
    fn predict_proba(&self, features: &SparseVector) -> [f64; 2];

    fn n_features(&self) -> usize;

    /// Argmax of `predict_proba`; an exact tie goes to class 0.
    fn predict(&self, features: &SparseVector) -> Label {
        let probs = self.predict_proba(features);
        if probs[1] > probs[0] {
            Label::Fake
        } else {
            Label::Real
        }
    }
}

fn ensure_finite(name: &str, values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        bail!("{name} contains non-finite values");
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("coef", &self.coef)?;
        ensure_finite("intercept", &[self.intercept])
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &SparseVector) -> [f64; 2] {
        let fake = sigmoid(features.dot(&self.coef) + self.intercept);
        [1.0 - fake, fake]
    }

    fn n_features(&self) -> usize {
        self.coef.len()
    }
}

/// Multinomial naive Bayes with log-space parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MultinomialNaiveBayes {
    pub class_log_prior: [f64; 2],
    pub feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNaiveBayes {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("class_log_prior", &self.class_log_prior)?;
        let [real, fake] = &self.feature_log_prob;
        if real.len() != fake.len() {
            bail!(
                "feature_log_prob rows differ in width ({} vs {})",
                real.len(),
                fake.len()
            );
        }
        ensure_finite("feature_log_prob", real)?;
        ensure_finite("feature_log_prob", fake)
    }
}

impl Classifier for MultinomialNaiveBayes {
    fn predict_proba(&self, features: &SparseVector) -> [f64; 2] {
        let jll = [
            features.dot(&self.feature_log_prob[0]) + self.class_log_prior[0],
            features.dot(&self.feature_log_prob[1]) + self.class_log_prior[1],
        ];
        let max = jll[0].max(jll[1]);
        let log_norm = max + ((jll[0] - max).exp() + (jll[1] - max).exp()).ln();
        [(jll[0] - log_norm).exp(), (jll[1] - log_norm).exp()]
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }
}
