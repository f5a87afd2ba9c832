use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema served by `GET /config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelInfo,
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputInfo {
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,  // categorical only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,              // numeric only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,              // numeric only
}

/// Declared input type. Unknown types are kept so they can be reported by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureKind {
    Categorical,
    Numeric,
    Other(String),
}

impl From<String> for FeatureKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "categorical" => FeatureKind::Categorical,
            "numeric" => FeatureKind::Numeric,
            _ => FeatureKind::Other(s),
        }
    }
}

impl From<FeatureKind> for String {
    fn from(kind: FeatureKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Categorical => f.write_str("categorical"),
            FeatureKind::Numeric => f.write_str("numeric"),
            FeatureKind::Other(s) => f.write_str(s),
        }
    }
}

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: f64,
    pub unit: String,
}

/// Body of a failed `POST /predict`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: serde_json::Value,
}

impl ErrorBody {
    /// The `error` field as display text; empty, zero, false and null count as absent
    pub fn message(&self) -> Option<String> {
        match &self.error {
            serde_json::Value::Null | serde_json::Value::Bool(false) => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Body of `GET /`. Every field is optional; reachability is all that matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

/// One submitted value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
    Null,
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Number(n) => write!(f, "{}", n),
            InputValue::Text(s) => f.write_str(s),
            InputValue::Null => Ok(()),
        }
    }
}

/// Payload for `POST /predict`: feature name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputData(BTreeMap<String, InputValue>);

impl InputData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: InputValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
