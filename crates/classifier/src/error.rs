use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model not found at {}. Train the model first.", path.display())]
    ModelNotFound { path: PathBuf },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model file {}: {source}", path.display())]
    ModelFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("CSV must contain {0}")]
    MissingColumns(String),
    #[error("Error reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("training data is empty")]
    EmptyDataset,
    #[error("training texts contain no usable tokens")]
    EmptyVocabulary,
}
