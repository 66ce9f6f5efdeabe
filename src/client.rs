use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{PredictionResult, SurveyInput};

pub const PREDICT_PATH: &str = "/predict";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP error! status: {}", .status.as_u16())]
    Request { status: StatusCode },

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid prediction response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can turn a survey into a prediction.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, input: SurveyInput) -> Result<PredictionResult, SubmitError>;
}

/// Multipart client for the prediction backend. One attempt per call: no
/// retries and no timeout.
pub struct HttpPredictionClient {
    client: Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let endpoint = endpoint_url(base_url)?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn endpoint_url(base_url: &str) -> anyhow::Result<Url> {
    let base = Url::parse(base_url)?;
    Ok(base.join(PREDICT_PATH)?)
}

pub fn build_form(input: SurveyInput) -> Result<Form, SubmitError> {
    let study_behavior = input.behavior.to_json()?;
    let mut form = Form::new()
        .text("student_id", input.student_id)
        .text("text", input.text);

    if let Some(image) = input.image {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(image.content_type)?;
        form = form.part("image", part);
    }

    Ok(form.text("study_behavior", study_behavior))
}

/// Non-2xx statuses fail before the body is looked at.
pub fn check_status(status: StatusCode) -> Result<(), SubmitError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(SubmitError::Request { status })
    }
}

pub fn decode_result(body: &[u8]) -> Result<PredictionResult, SubmitError> {
    Ok(serde_json::from_slice(body)?)
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, input: SurveyInput) -> Result<PredictionResult, SubmitError> {
        info!(
            student_id = %input.student_id,
            behavior = ?input.behavior.as_array(),
            image = input.image.is_some(),
            "submitting survey"
        );
        let form = build_form(input)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        check_status(response.status())?;

        let body = response.bytes().await?;
        let result = decode_result(&body)?;
        debug!(?result, "received result");
        Ok(result)
    }
}
