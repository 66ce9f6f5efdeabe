use serde::{Deserialize, Deserializer, Serialize};

/// The four behaviour metrics, in the order the backend expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BehaviorVector {
    pub study_time: i64,
    pub social_media_minutes: i64,
    pub sleep_hours: i64,
    pub deadline_count: i64,
}

impl BehaviorVector {
    pub fn as_array(&self) -> [i64; 4] {
        [
            self.study_time,
            self.social_media_minutes,
            self.sleep_hours,
            self.deadline_count,
        ]
    }

    /// JSON array text sent as the `study_behavior` form field.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.as_array())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// One survey submission, built fresh per submit and dropped once sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyInput {
    pub student_id: String,
    pub text: String,
    pub image: Option<ImageUpload>,
    pub behavior: BehaviorVector,
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub stress_score: f64,
    pub depression_score: f64,
    pub stress_level: String,
    pub depression_level: String,
    #[serde(default, deserialize_with = "strict_flag")]
    pub alert_counselor: bool,
    #[serde(default, deserialize_with = "strict_flag")]
    pub alert_proctor: bool,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    #[serde(default)]
    pub text_sentiment: Option<f64>,
}

// Only a JSON `true` raises an alert; "true", 1 and null all read as false.
fn strict_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(matches!(value, serde_json::Value::Bool(true)))
}

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Rendered(PredictionResult),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub student_id: String,
    pub outcome: SubmissionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> PredictionResult {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn behavior_serializes_as_plain_array() {
        let behavior = BehaviorVector {
            study_time: 12,
            social_media_minutes: 0,
            sleep_hours: 0,
            deadline_count: 3,
        };
        assert_eq!(behavior.to_json().unwrap(), "[12,0,0,3]");
    }

    #[test]
    fn alert_flags_require_json_true() {
        let result = parse(
            r#"{"stress_score":0.4,"depression_score":0.2,"stress_level":"Moderate",
                "depression_level":"Normal","alert_counselor":"true","alert_proctor":1}"#,
        );
        assert!(!result.alert_counselor);
        assert!(!result.alert_proctor);

        let result = parse(
            r#"{"stress_score":0.4,"depression_score":0.2,"stress_level":"Moderate",
                "depression_level":"Normal","alert_counselor":true,"alert_proctor":null}"#,
        );
        assert!(result.alert_counselor);
        assert!(!result.alert_proctor);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let result = parse(
            r#"{"stress_score":0.1,"depression_score":0.1,"stress_level":"Normal",
                "depression_level":"Normal"}"#,
        );
        assert!(!result.alert_counselor);
        assert!(!result.alert_proctor);
        assert_eq!(result.recommendations, None);
        assert_eq!(result.text_sentiment, None);
    }

    #[test]
    fn missing_score_is_rejected() {
        let result = serde_json::from_str::<PredictionResult>(
            r#"{"depression_score":0.1,"stress_level":"Normal","depression_level":"Normal"}"#,
        );
        assert!(result.is_err());
    }
}
