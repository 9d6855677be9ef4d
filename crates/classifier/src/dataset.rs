//! CSV ticket tables for bulk classification and training.

use std::{fs::File, io::Read, path::Path};

use indexmap::IndexMap;
use shared::protocol::TEXT_COLUMN;

use crate::error::ClassifierError;

pub const CATEGORY_COLUMN: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTicket {
    pub text: String,
    pub category: String,
}

/// A parsed CSV with a header row. Every cell is kept as text.
#[derive(Debug, Clone)]
pub struct TicketTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TicketTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ClassifierError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self, ClassifierError> {
        let file = File::open(path).map_err(|source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }

    /// The `text` column, or an error naming it when absent.
    pub fn texts(&self) -> Result<Vec<&str>, ClassifierError> {
        self.column(TEXT_COLUMN)
            .ok_or_else(|| ClassifierError::MissingColumns(format!("a '{TEXT_COLUMN}' column")))
    }

    /// Rows as header-keyed maps, in file order with columns in header order.
    pub fn records(&self) -> impl Iterator<Item = IndexMap<String, String>> + '_ {
        self.rows.iter().map(|row| {
            self.headers
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
    }

    pub fn labeled(&self) -> Result<Vec<LabeledTicket>, ClassifierError> {
        let (Some(texts), Some(categories)) =
            (self.column(TEXT_COLUMN), self.column(CATEGORY_COLUMN))
        else {
            return Err(ClassifierError::MissingColumns(format!(
                "'{TEXT_COLUMN}' and '{CATEGORY_COLUMN}' columns"
            )));
        };
        Ok(texts
            .into_iter()
            .zip(categories)
            .map(|(text, category)| LabeledTicket {
                text: text.to_string(),
                category: category.to_string(),
            })
            .collect())
    }
}
