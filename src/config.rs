use clap::Parser;
use std::path::PathBuf;

use crate::artifacts::ArtifactConfig;
use crate::types::ModelKind;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to bind to
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Hugging Face Hub repository holding the model artifacts
    #[arg(long, env = "MODEL_ID")]
    pub model_id: Option<String>,

    /// Local directory holding the model artifacts
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Model revision/branch on Hugging Face
    #[arg(long, env = "MODEL_REVISION", default_value = "main")]
    pub model_revision: String,

    /// Classifier preselected on the demo page
    #[arg(long, env = "DEFAULT_MODEL", default_value = "logistic_regression")]
    pub default_model: ModelKind,
}

impl From<&Config> for ArtifactConfig {
    fn from(config: &Config) -> Self {
        Self {
            model_id: config.model_id.clone(),
            model_path: config.model_path.clone(),
            revision: config.model_revision.clone(),
        }
    }
}

impl Config {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from([
            "fake-news-detector",
            "--model-path",
            "models",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ]);
        assert_eq!(config.server_address(), "0.0.0.0:9000");
        assert_eq!(config.default_model, ModelKind::LogisticRegression);

        let artifacts = ArtifactConfig::from(&config);
        assert_eq!(artifacts.model_path, Some(PathBuf::from("models")));
        assert_eq!(artifacts.revision, "main");
    }

    #[test]
    fn test_default_model_accepts_display_name() {
        let config = Config::parse_from(["fake-news-detector", "--default-model", "Naive Bayes"]);
        assert_eq!(config.default_model, ModelKind::NaiveBayes);
    }
}
