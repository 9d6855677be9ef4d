//! Ticket classification: routing table, trained model, keyword fallback and training.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use shared::protocol::ClassificationResult;
use tracing::info;

pub mod dataset;
pub mod error;
pub mod keyword;
pub mod model;
pub mod routing;
pub mod text;
pub mod training;

pub use dataset::{LabeledTicket, TicketTable};
pub use error::ClassifierError;
pub use keyword::KeywordClassifier;
pub use model::NaiveBayesModel;

pub trait TicketClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Predicted category label for one ticket text.
    fn predict(&self, text: &str) -> Result<String, ClassifierError>;

    fn predict_batch(&self, texts: &[&str]) -> Result<Vec<String>, ClassifierError> {
        texts.iter().map(|text| self.predict(text)).collect()
    }
}

/// Category plus routed team for one ticket.
pub fn classify(
    classifier: &dyn TicketClassifier,
    text: &str,
) -> Result<ClassificationResult, ClassifierError> {
    let category = classifier.predict(text)?;
    let assigned_team = routing::assign_team(&category).to_string();
    Ok(ClassificationResult {
        category,
        assigned_team,
    })
}

/// Loads the model file on first use. Failed loads are not cached, so a model
/// trained after startup is picked up by the next request.
pub struct LazyModelClassifier {
    path: PathBuf,
    model: Mutex<Option<Arc<NaiveBayesModel>>>,
}

impl LazyModelClassifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn model(&self) -> Result<Arc<NaiveBayesModel>, ClassifierError> {
        let mut slot = self
            .model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(NaiveBayesModel::load(&self.path)?);
        info!(path = %self.path.display(), classes = model.classes().len(), "loaded model");
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }
}

impl TicketClassifier for LazyModelClassifier {
    fn name(&self) -> &'static str {
        "naive_bayes"
    }

    fn predict(&self, text: &str) -> Result<String, ClassifierError> {
        self.model()?.predict(text)
    }

    fn predict_batch(&self, texts: &[&str]) -> Result<Vec<String>, ClassifierError> {
        let model = self.model()?;
        Ok(texts
            .iter()
            .map(|text| model.predict_class(text).to_string())
            .collect())
    }
}
