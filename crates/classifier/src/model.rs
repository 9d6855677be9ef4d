//! TF-IDF features feeding a multinomial naive Bayes classifier.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{dataset::LabeledTicket, error::ClassifierError, text, TicketClassifier};

/// Laplace smoothing applied to every feature count.
const ALPHA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesModel {
    pub fn fit(samples: &[LabeledTicket]) -> Result<Self, ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }

        let documents: Vec<Vec<String>> = samples.iter().map(|s| text::terms(&s.text)).collect();
        let vocabulary: HashMap<String, usize> = documents
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
        if vocabulary.is_empty() {
            return Err(ClassifierError::EmptyVocabulary);
        }

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for document in &documents {
            let unique: BTreeSet<usize> = document.iter().map(|term| vocabulary[term]).collect();
            for index in unique {
                document_frequency[index] += 1;
            }
        }
        let n_documents = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let classes: Vec<String> = samples
            .iter()
            .map(|s| s.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let class_index: HashMap<String, usize> = classes
            .iter()
            .enumerate()
            .map(|(index, class)| (class.clone(), index))
            .collect();

        let mut model = Self {
            vocabulary,
            idf,
            classes,
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
        };

        let n_features = model.vocabulary.len();
        let mut class_count = vec![0usize; model.classes.len()];
        let mut feature_count = vec![vec![0.0f64; n_features]; model.classes.len()];
        for (sample, document) in samples.iter().zip(&documents) {
            let class = class_index[sample.category.as_str()];
            class_count[class] += 1;
            for (feature, weight) in model.weigh(document) {
                feature_count[class][feature] += weight;
            }
        }

        model.class_log_prior = class_count
            .iter()
            .map(|&count| (count as f64 / n_documents).ln())
            .collect();
        model.feature_log_prob = feature_count
            .iter()
            .map(|counts| {
                let total: f64 = counts.iter().sum::<f64>() + ALPHA * n_features as f64;
                counts
                    .iter()
                    .map(|count| ((count + ALPHA) / total).ln())
                    .collect()
            })
            .collect();

        info!(
            documents = samples.len(),
            features = n_features,
            classes = model.classes.len(),
            "fitted naive bayes model"
        );
        Ok(model)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sparse, L2-normalised TF-IDF vector of a text.
    pub fn vectorize(&self, text: &str) -> Vec<(usize, f64)> {
        self.weigh(&text::terms(text))
    }

    fn weigh(&self, terms: &[String]) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for term in terms {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_default() += 1;
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| (index, (1.0 + (count as f64).ln()) * self.idf[index]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut weights {
                *weight /= norm;
            }
        }
        weights
    }

    /// Most probable class for a text. Texts with no known terms get the
    /// class with the largest prior.
    pub fn predict_class(&self, text: &str) -> &str {
        let features = self.vectorize(text);
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (class, prior) in self.class_log_prior.iter().enumerate() {
            let score = prior
                + features
                    .iter()
                    .map(|(feature, weight)| weight * self.feature_log_prob[class][*feature])
                    .sum::<f64>();
            if score > best_score {
                best = class;
                best_score = score;
            }
        }
        &self.classes[best]
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let format_err = |source| ClassifierError::ModelFormat {
            path: path.to_path_buf(),
            source,
        };
        let model: Self = serde_json::from_str(&raw).map_err(format_err)?;
        model
            .check_shape()
            .map_err(|reason| format_err(serde::de::Error::custom(reason)))?;
        Ok(model)
    }

    /// Dimensions every lookup in `predict_class` relies on.
    fn check_shape(&self) -> Result<(), String> {
        let n_classes = self.classes.len();
        let n_features = self.idf.len();
        if n_classes == 0 {
            return Err("model has no classes".to_string());
        }
        if self.class_log_prior.len() != n_classes || self.feature_log_prob.len() != n_classes {
            return Err(format!("expected per-class tables for {n_classes} classes"));
        }
        if self.feature_log_prob.iter().any(|row| row.len() != n_features) {
            return Err(format!("expected {n_features} feature weights per class"));
        }
        if self.vocabulary.values().any(|&index| index >= n_features) {
            return Err(format!("vocabulary index outside {n_features} features"));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let io_err = |source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let serialized =
            serde_json::to_vec(self).map_err(|source| ClassifierError::ModelFormat {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(path, serialized).map_err(io_err)
    }
}

impl TicketClassifier for NaiveBayesModel {
    fn name(&self) -> &'static str {
        "naive_bayes"
    }

    fn predict(&self, text: &str) -> Result<String, ClassifierError> {
        Ok(self.predict_class(text).to_string())
    }
}
