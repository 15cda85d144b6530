use anyhow::{Context, Result, bail};
use hf_hub::{Repo, RepoType, api::tokio::Api};
use metrics::counter;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::classifier::{Classifier, LogisticRegression, MultinomialNaiveBayes};
use crate::types::ModelKind;
use crate::vectorizer::{TfidfVectorizer, VectorizerArtifact};

pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const LOGISTIC_REGRESSION_FILE: &str = "lr_model.json";
pub const NAIVE_BAYES_FILE: &str = "naive_bayes_model.json";

#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_id: Option<String>,
    pub model_path: Option<PathBuf>,
    pub revision: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_id: None,
            model_path: None,
            revision: "main".to_string(),
        }
    }
}

struct ArtifactFiles {
    vectorizer: PathBuf,
    logistic_regression: PathBuf,
    naive_bayes: PathBuf,
}

/// The fitted vectorizer and both classifiers, loaded once and never mutated.
pub struct ModelArtifacts {
    vectorizer: TfidfVectorizer,
    logistic_regression: LogisticRegression,
    naive_bayes: MultinomialNaiveBayes,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("n_features", &self.vectorizer.n_features())
            .finish()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read artifact {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse artifact {}", path.display()))
}

impl ModelArtifacts {
    async fn resolve(config: &ArtifactConfig) -> Result<ArtifactFiles> {
        // A local directory wins over the Hub.
        match &config.model_path {
            Some(base_path) => {
                if !base_path.is_dir() {
                    bail!("Model path {} is not a directory.", base_path.display());
                }
                Ok(ArtifactFiles {
                    vectorizer: base_path.join(VECTORIZER_FILE),
                    logistic_regression: base_path.join(LOGISTIC_REGRESSION_FILE),
                    naive_bayes: base_path.join(NAIVE_BAYES_FILE),
                })
            }
            None => {
                let Some(model_id) = config.model_id.clone() else {
                    bail!("Either model_id or model_path must be specified");
                };

                let repo = Repo::with_revision(model_id, RepoType::Model, config.revision.clone());
                let api = Api::new()?;
                let api = api.repo(repo);
                let api = &api;
                let fetch = move |file: &'static str| async move {
                    api.get(file)
                        .await
                        .with_context(|| format!("failed to fetch {file}"))
                };
                let (vectorizer, logistic_regression, naive_bayes) = futures::try_join!(
                    fetch(VECTORIZER_FILE),
                    fetch(LOGISTIC_REGRESSION_FILE),
                    fetch(NAIVE_BAYES_FILE),
                )?;
                Ok(ArtifactFiles {
                    vectorizer,
                    logistic_regression,
                    naive_bayes,
                })
            }
        }
    }

    #[tracing::instrument(skip(config), fields(model_id = ?config.model_id, model_path = ?config.model_path))]
    pub async fn load(config: &ArtifactConfig) -> Result<Self> {
        let files = Self::resolve(config).await?;

        let vectorizer: VectorizerArtifact = read_json(&files.vectorizer)?;
        let logistic_regression: LogisticRegression = read_json(&files.logistic_regression)?;
        let naive_bayes: MultinomialNaiveBayes = read_json(&files.naive_bayes)?;

        let artifacts = Self::from_parts(
            TfidfVectorizer::from_artifact(vectorizer)
                .with_context(|| format!("invalid vectorizer {}", files.vectorizer.display()))?,
            logistic_regression,
            naive_bayes,
        )?;

        counter!("model_loads_total").increment(1);
        tracing::info!(
            n_features = artifacts.vectorizer.n_features(),
            "Model artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Assembles already-parsed parts, checking they agree on feature width.
    pub fn from_parts(
        vectorizer: TfidfVectorizer,
        logistic_regression: LogisticRegression,
        naive_bayes: MultinomialNaiveBayes,
    ) -> Result<Self> {
        logistic_regression
            .validate()
            .context("invalid logistic regression model")?;
        naive_bayes.validate().context("invalid naive bayes model")?;

        let n_features = vectorizer.n_features();
        for (kind, width) in [
            (ModelKind::LogisticRegression, logistic_regression.n_features()),
            (ModelKind::NaiveBayes, naive_bayes.n_features()),
        ] {
            if width != n_features {
                bail!(
                    "{} expects {} features but the vectorizer produces {}",
                    kind.display_name(),
                    width,
                    n_features
                );
            }
        }

        Ok(Self {
            vectorizer,
            logistic_regression,
            naive_bayes,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self, kind: ModelKind) -> &dyn Classifier {
        match kind {
            ModelKind::LogisticRegression => &self.logistic_regression,
            ModelKind::NaiveBayes => &self.naive_bayes,
        }
    }
}
