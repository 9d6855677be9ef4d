use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use classifier::{classify, routing, ClassifierError, TicketClassifier, TicketTable};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        ClassificationRequest, ClassificationResult, HealthResponse, TicketRecord, BULK_FILE_FIELD,
    },
};
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;

pub(crate) const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

const PREDICTION_COLUMNS: [&str; 2] = ["category", "assigned_team"];

/// Error response whose body is the plain-text message, so clients can show
/// the body verbatim.
#[derive(Debug)]
pub(crate) struct ApiFailure(pub(crate) ApiError);

impl ApiFailure {
    fn validation(message: impl Into<String>) -> Self {
        Self(ApiError::validation(message))
    }

    fn status(&self) -> StatusCode {
        match self.0.code {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::ModelUnavailable | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = ?self.0.code, message = %self.0.message, "request failed");
        } else {
            warn!(code = ?self.0.code, message = %self.0.message, "request rejected");
        }
        (status, self.0.message).into_response()
    }
}

impl From<ClassifierError> for ApiFailure {
    fn from(value: ClassifierError) -> Self {
        let code = match &value {
            ClassifierError::ModelNotFound { .. }
            | ClassifierError::Io { .. }
            | ClassifierError::ModelFormat { .. } => ErrorCode::ModelUnavailable,
            ClassifierError::MissingColumns(_)
            | ClassifierError::Csv(_)
            | ClassifierError::EmptyDataset => ErrorCode::Validation,
            ClassifierError::EmptyVocabulary => ErrorCode::Internal,
        };
        Self(ApiError::new(code, value.to_string()))
    }
}

impl From<MultipartError> for ApiFailure {
    fn from(value: MultipartError) -> Self {
        let status = value.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::Validation
        };
        Self(ApiError::new(code, value.body_text()))
    }
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

pub(crate) async fn classify_ticket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassificationRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ApiFailure> {
    let Json(req) = payload.map_err(|rejection| ApiFailure::validation(rejection.body_text()))?;
    if req.text.trim().is_empty() {
        return Err(ApiFailure::validation("ticket text cannot be empty"));
    }

    let classifier = Arc::clone(&state.classifier);
    let result = tokio::task::spawn_blocking(move || classify(classifier.as_ref(), &req.text))
        .await
        .map_err(|e| ApiFailure(ApiError::internal(e.to_string())))??;

    debug!(
        classifier = state.classifier.name(),
        category = %result.category,
        "classified ticket"
    );
    Ok(Json(result))
}

pub(crate) async fn classify_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<TicketRecord>>, ApiFailure> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(BULK_FILE_FIELD) {
            let filename = field.file_name().map(str::to_string);
            upload = Some((filename, field.bytes().await?));
            break;
        }
    }
    let Some((filename, bytes)) = upload else {
        return Err(ApiFailure::validation(format!(
            "multipart field '{BULK_FILE_FIELD}' is required"
        )));
    };

    let table = TicketTable::from_reader(&bytes[..])?;
    table.texts()?;

    let classifier = Arc::clone(&state.classifier);
    let records = tokio::task::spawn_blocking(move || classify_table(classifier.as_ref(), &table))
        .await
        .map_err(|e| ApiFailure(ApiError::internal(e.to_string())))??;

    info!(
        filename = filename.as_deref().unwrap_or("<unnamed>"),
        rows = records.len(),
        classifier = state.classifier.name(),
        "classified ticket file"
    );
    Ok(Json(records))
}

fn classify_table(
    classifier: &dyn TicketClassifier,
    table: &TicketTable,
) -> Result<Vec<TicketRecord>, ClassifierError> {
    let categories = classifier.predict_batch(&table.texts()?)?;
    Ok(table
        .records()
        .zip(categories)
        .map(|(mut columns, category)| {
            for column in PREDICTION_COLUMNS {
                columns.shift_remove(column);
            }
            let assigned_team = routing::assign_team(&category).to_string();
            TicketRecord {
                columns,
                category,
                assigned_team,
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
