//! HTTP access to the classification endpoints.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::protocol::{
    ClassificationRequest, ClassificationResult, BULK_FILE_FIELD, CLASSIFY_FILE_ROUTE,
    CLASSIFY_ROUTE,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::dom::SelectedFile;

const CSV_MIME: &str = "text/csv";

/// Failure of one API call. The display text is what the user sees after
/// the `Error: ` prefix.
#[derive(Debug, Error)]
pub enum ApiCallError {
    /// Server answered with a non-success status; the message is the response body.
    #[error("{body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait]
pub trait ClassificationApi: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ApiCallError>;

    /// Uploads one CSV and returns the server's JSON verbatim.
    async fn classify_file(&self, file: &SelectedFile) -> Result<serde_json::Value, ApiCallError>;
}

#[derive(Clone)]
pub struct HttpClassificationApi {
    http: Client,
    base_url: Url,
}

impl HttpClassificationApi {
    pub fn new(server_url: &str) -> Result<Self, ApiCallError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(server_url.trim())?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, route: &str) -> Result<Url, ApiCallError> {
        Ok(self.base_url.join(route)?)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiCallError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiCallError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ClassificationApi for HttpClassificationApi {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ApiCallError> {
        let url = self.endpoint(CLASSIFY_ROUTE)?;
        debug!(%url, chars = request.text.len(), "posting ticket for classification");
        let response = self.http.post(url).json(request).send().await?;
        read_json(response).await
    }

    async fn classify_file(&self, file: &SelectedFile) -> Result<serde_json::Value, ApiCallError> {
        let url = self.endpoint(CLASSIFY_FILE_ROUTE)?;
        debug!(%url, file = %file.name, bytes = file.contents.len(), "uploading ticket file");
        let part = Part::bytes(file.contents.clone())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)?;
        let form = Form::new().part(BULK_FILE_FIELD, part);
        let response = self.http.post(url).multipart(form).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_resolve_against_server_root() {
        let api = HttpClassificationApi::new(" http://127.0.0.1:8000/app/ ").expect("api");
        assert_eq!(
            api.endpoint(CLASSIFY_ROUTE).expect("url").as_str(),
            "http://127.0.0.1:8000/classify"
        );
        assert_eq!(
            api.endpoint(CLASSIFY_FILE_ROUTE).expect("url").as_str(),
            "http://127.0.0.1:8000/classify_file"
        );
    }

    #[test]
    fn rejects_relative_server_url() {
        assert!(matches!(
            HttpClassificationApi::new("localhost"),
            Err(ApiCallError::Url(_))
        ));
    }

    #[test]
    fn status_error_displays_response_body() {
        let err = ApiCallError::Status {
            status: 400,
            body: "bad request".to_string(),
        };
        assert_eq!(err.to_string(), "bad request");
    }
}
