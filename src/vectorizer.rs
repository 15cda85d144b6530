//! TF-IDF transform for a vectorizer fitted offline.
//!
//! The artifact carries the fitted vocabulary and IDF weights together with the
//! preprocessing options that were in effect at fit time, so that inference
//! reproduces the same features.

use anyhow::{Result, bail};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// On-disk form of the fitted vectorizer.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub token_pattern: Option<String>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    /// `null` and a missing field both mean no stop words.
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default)]
    pub sublinear_tf: bool,
    /// A missing field means `l2`; `null` means no normalization.
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_lowercase() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Output of [`TfidfVectorizer::transform`].
#[derive(Debug, Clone)]
pub struct Transformed {
    pub features: SparseVector,
    /// Tokens left after stop-word removal.
    pub tokens: usize,
    /// N-grams found in the vocabulary.
    pub known: usize,
}

/// Sparse feature vector, entries sorted by column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn new(dim: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(index, _)| *index);
        Self { dim, entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn dot(&self, dense: &[f64]) -> f64 {
        debug_assert_eq!(dense.len(), self.dim);
        self.entries()
            .iter()
            .map(|(index, value)| value * dense[*index])
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    lowercase: bool,
    pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let n_features = artifact.idf.len();
        if artifact.vocabulary.len() != n_features {
            bail!(
                "vocabulary has {} terms but idf has {} weights",
                artifact.vocabulary.len(),
                n_features
            );
        }
        if let Some((term, index)) = artifact
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= n_features)
        {
            bail!("term '{term}' maps to column {index}, outside 0..{n_features}");
        }
        let columns: HashSet<usize> = artifact.vocabulary.values().copied().collect();
        if columns.len() != artifact.vocabulary.len() {
            bail!(
                "vocabulary maps {} terms onto {} distinct columns",
                artifact.vocabulary.len(),
                columns.len()
            );
        }
        if artifact.idf.iter().any(|w| !w.is_finite()) {
            bail!("idf contains non-finite weights");
        }
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("invalid ngram_range ({min_n}, {max_n})");
        }

        let pattern = artifact
            .token_pattern
            .as_deref()
            .map(|p| p.trim_start_matches("(?u)"))
            .unwrap_or(DEFAULT_TOKEN_PATTERN);
        let pattern = Regex::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid token_pattern: {e}"))?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            pattern,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.unwrap_or_default().into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm.unwrap_or(Norm::None),
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_owned()
        };
        self.pattern
            .find_iter(&text)
            .map(|m| m.as_str().to_owned())
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        if (min_n, max_n) == (1, 1) {
            return tokens.to_vec();
        }
        let mut grams = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    pub fn transform(&self, text: &str) -> Transformed {
        let tokens = self.tokenize(text);
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        let mut known = 0;
        for gram in self.ngrams(&tokens) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
                known += 1;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (index, tf * self.idf[index])
            })
            .collect();

        let norm = match self.norm {
            Norm::L2 => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Norm::L1 => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if norm > 0.0 {
            for (_, value) in entries.iter_mut() {
                *value /= norm;
            }
        }

        Transformed {
            features: SparseVector::new(self.n_features(), entries),
            tokens: tokens.len(),
            known,
        }
    }
}
