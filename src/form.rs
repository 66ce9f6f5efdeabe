use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::client::SubmitError;
use crate::models::{BehaviorVector, ImageUpload, SurveyInput};

pub const STUDENT_ID: &str = "student_id";
pub const TEXT: &str = "text";
pub const IMAGE: &str = "image";
pub const STUDY_TIME: &str = "study_time";
pub const SOCIAL_MEDIA: &str = "social_media";
pub const SLEEP_HOURS: &str = "sleep_hours";
pub const DEADLINES: &str = "deadlines";

pub const REQUIRED_FIELDS: [&str; 7] = [
    STUDENT_ID,
    TEXT,
    IMAGE,
    STUDY_TIME,
    SOCIAL_MEDIA,
    SLEEP_HOURS,
    DEADLINES,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("required form field `{0}` not found")]
    MissingField(String),
}

/// Raw field values exactly as entered. Numeric fields stay text until
/// assembly so unparseable input can fall back to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyForm {
    pub student_id: String,
    pub text: String,
    pub image: Option<PathBuf>,
    pub study_time: String,
    pub social_media: String,
    pub sleep_hours: String,
    pub deadlines: String,
}

impl SurveyForm {
    /// Bind every required field up front; any absent id is an error.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FormError> {
        for id in REQUIRED_FIELDS {
            if !fields.contains_key(id) {
                return Err(FormError::MissingField(id.to_string()));
            }
        }

        let value = |id: &str| fields.get(id).cloned().unwrap_or_default();
        let image = value(IMAGE);

        Ok(Self {
            student_id: value(STUDENT_ID),
            text: value(TEXT),
            image: if image.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(image.trim()))
            },
            study_time: value(STUDY_TIME),
            social_media: value(SOCIAL_MEDIA),
            sleep_hours: value(SLEEP_HOURS),
            deadlines: value(DEADLINES),
        })
    }

    pub fn behavior(&self) -> BehaviorVector {
        BehaviorVector {
            study_time: parse_int_or_zero(&self.study_time),
            social_media_minutes: parse_int_or_zero(&self.social_media),
            sleep_hours: parse_int_or_zero(&self.sleep_hours),
            deadline_count: parse_int_or_zero(&self.deadlines),
        }
    }

    /// Build the submission payload, reading the selected image if any.
    pub async fn assemble(&self) -> Result<SurveyInput, SubmitError> {
        let image = match &self.image {
            Some(path) => Some(load_image(path).await?),
            None => None,
        };

        Ok(SurveyInput {
            student_id: self.student_id.clone(),
            text: self.text.clone(),
            image,
            behavior: self.behavior(),
        })
    }
}

pub async fn load_image(path: &Path) -> Result<ImageUpload, SubmitError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SubmitError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    debug!(file = %file_name, size = bytes.len(), "loaded image");

    Ok(ImageUpload {
        content_type: content_type_for(path),
        file_name,
        bytes,
    })
}

pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Lenient integer parsing in the style of a browser number field: leading
/// whitespace and sign are accepted, digits are read up to the first other
/// character, a `0x` prefix switches to hex, and no digits at all gives 0.
pub fn parse_int_or_zero(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for ch in digits.chars() {
        let Some(digit) = ch.to_digit(radix) else {
            break;
        };
        seen = true;
        value = value
            .saturating_mul(i64::from(radix))
            .saturating_add(i64::from(digit));
    }

    if !seen {
        return 0;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Read survey rows from a CSV file whose header row names the form fields.
pub fn read_csv(path: &Path) -> anyhow::Result<Vec<SurveyForm>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut forms = Vec::new();

    for result in reader.deserialize::<HashMap<String, String>>() {
        let row = result?;
        forms.push(SurveyForm::from_fields(&row)?);
    }

    Ok(forms)
}
