//! Hold-out splitting, fitting and evaluation for the naive Bayes model.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{info, warn};

use crate::{dataset::LabeledTicket, error::ClassifierError, model::NaiveBayesModel};

pub const DEFAULT_SEED: u64 = 42;
const MIN_TEST_FRACTION: f64 = 0.2;
/// Below this size a failed stratified split trains on everything.
const SMALL_DATASET_ROWS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Stratified,
    /// Train and evaluate on the full set, no hold-out.
    FullSet,
    Shuffled,
}

#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Vec<LabeledTicket>,
    pub test: Vec<LabeledTicket>,
    pub strategy: SplitStrategy,
}

/// Fraction large enough for every class to appear in the test set.
pub fn test_fraction(n_rows: usize, n_classes: usize) -> f64 {
    if n_rows == 0 {
        return MIN_TEST_FRACTION;
    }
    MIN_TEST_FRACTION.max(n_classes as f64 / n_rows as f64 + 0.01)
}

pub fn split(samples: &[LabeledTicket], seed: u64) -> TrainTestSplit {
    let n_classes = samples
        .iter()
        .map(|s| s.category.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let fraction = test_fraction(samples.len(), n_classes);
    let mut rng = StdRng::seed_from_u64(seed);

    if let Some((train, test)) = stratified(samples, fraction, &mut rng) {
        return TrainTestSplit {
            train,
            test,
            strategy: SplitStrategy::Stratified,
        };
    }

    if samples.len() < SMALL_DATASET_ROWS {
        info!(
            rows = samples.len(),
            "small dataset detected; training on full set without hold-out test"
        );
        return TrainTestSplit {
            train: samples.to_vec(),
            test: samples.to_vec(),
            strategy: SplitStrategy::FullSet,
        };
    }

    warn!(
        rows = samples.len(),
        "dataset too small for stratified split; proceeding without stratification"
    );
    let mut shuffled = samples.to_vec();
    shuffled.shuffle(&mut rng);
    let n_test = test_size(shuffled.len(), fraction);
    let test = shuffled.split_off(shuffled.len() - n_test);
    TrainTestSplit {
        train: shuffled,
        test,
        strategy: SplitStrategy::Shuffled,
    }
}

fn test_size(n_rows: usize, fraction: f64) -> usize {
    ((n_rows as f64 * fraction).ceil() as usize).clamp(1, n_rows.saturating_sub(1).max(1))
}

fn stratified(
    samples: &[LabeledTicket],
    fraction: f64,
    rng: &mut StdRng,
) -> Option<(Vec<LabeledTicket>, Vec<LabeledTicket>)> {
    let mut by_class: BTreeMap<&str, Vec<&LabeledTicket>> = BTreeMap::new();
    for sample in samples {
        by_class.entry(sample.category.as_str()).or_default().push(sample);
    }

    let n_test = test_size(samples.len(), fraction);
    let n_train = samples.len().saturating_sub(n_test);
    if by_class.values().any(|members| members.len() < 2)
        || n_test < by_class.len()
        || n_train < by_class.len()
    {
        return None;
    }

    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for members in by_class.values_mut() {
        members.shuffle(rng);
        let take = ((members.len() as f64 * fraction).round() as usize).clamp(1, members.len() - 1);
        test.extend(members[..take].iter().map(|s| (*s).clone()));
        train.extend(members[take..].iter().map(|s| (*s).clone()));
    }
    train.shuffle(rng);
    test.shuffle(rng);
    Some((train, test))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
}

pub fn evaluate(model: &NaiveBayesModel, test: &[LabeledTicket]) -> EvaluationReport {
    let predictions: Vec<&str> = test.iter().map(|s| model.predict_class(&s.text)).collect();
    let labels: BTreeSet<&str> = test
        .iter()
        .map(|s| s.category.as_str())
        .chain(predictions.iter().copied())
        .collect();

    let correct = test
        .iter()
        .zip(&predictions)
        .filter(|(sample, predicted)| sample.category == **predicted)
        .count();
    let accuracy = if test.is_empty() {
        0.0
    } else {
        correct as f64 / test.len() as f64
    };

    let classes = labels
        .into_iter()
        .map(|label| {
            let mut true_positive = 0usize;
            let mut predicted_positive = 0usize;
            let mut support = 0usize;
            for (sample, predicted) in test.iter().zip(&predictions) {
                let actual = sample.category == label;
                let guessed = *predicted == label;
                support += usize::from(actual);
                predicted_positive += usize::from(guessed);
                true_positive += usize::from(actual && guessed);
            }
            let precision = ratio(true_positive, predicted_positive);
            let recall = ratio(true_positive, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                class: label.to_string(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    EvaluationReport { accuracy, classes }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.class.len())
            .max()
            .unwrap_or(0)
            .max(12);
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.class, class.precision, class.recall, class.f1, class.support
            )?;
        }
        let support: usize = self.classes.iter().map(|c| c.support).sum();
        write!(f, "{:>width$} {:>29.2} {:>9}", "accuracy", self.accuracy, support)
    }
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: NaiveBayesModel,
    pub report: EvaluationReport,
    pub strategy: SplitStrategy,
}

pub fn train(samples: &[LabeledTicket], seed: u64) -> Result<TrainingOutcome, ClassifierError> {
    if samples.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }
    let split = split(samples, seed);
    let model = NaiveBayesModel::fit(&split.train)?;
    let report = evaluate(&model, &split.test);
    info!(
        strategy = ?split.strategy,
        train = split.train.len(),
        test = split.test.len(),
        accuracy = report.accuracy,
        "training finished"
    );
    Ok(TrainingOutcome {
        model,
        report,
        strategy: split.strategy,
    })
}

#[cfg(test)]
#[path = "tests/training_tests.rs"]
mod tests;
