//! Form state built from a `ModelConfig`, plus the checks a browser would
//! otherwise enforce natively (required, numeric type, min/max).

use thiserror::Error;

use crate::error::ClientError;
use crate::model::{Feature, FeatureKind, InputData, InputValue, ModelConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field}: '{input}' is not a number")]
    NotANumber { field: String, input: String },

    #[error("{field} must be at least {min}")]
    BelowMin { field: String, min: f64 },

    #[error("{field} must be at most {max}")]
    AboveMax { field: String, max: f64 },

    #[error("{field}: '{input}' is not one of the allowed options")]
    UnknownOption { field: String, input: String },
}

/// Current value of one rendered control
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Index into the feature's options; `None` while the placeholder is selected
    Choice(Option<usize>),
    /// Raw text of a number input
    Number(String),
}

/// Values of every rendered control, parallel to `ModelConfig::features`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Vec<FieldValue>,
}

impl FormState {
    /// Rebuild the form from scratch: one control per feature, in order
    pub fn build(config: &ModelConfig) -> Result<Self, ClientError> {
        let mut values = Vec::with_capacity(config.features.len());

        for feature in &config.features {
            let value = match &feature.kind {
                FeatureKind::Categorical => {
                    if feature.options.is_none() {
                        return Err(ClientError::config(format!(
                            "categorical feature '{}' has no options",
                            feature.name
                        )));
                    }
                    FieldValue::Choice(None)
                }
                FeatureKind::Numeric => FieldValue::Number(String::new()),
                FeatureKind::Other(kind) => {
                    return Err(ClientError::UnsupportedFeature {
                        feature: feature.name.clone(),
                        kind: kind.clone(),
                    });
                }
            };
            values.push(value);
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Move a select control to its next option (wraps, never back to the placeholder)
    pub fn select_next(&mut self, index: usize, option_count: usize) {
        if option_count == 0 {
            return;
        }
        if let Some(FieldValue::Choice(choice)) = self.values.get_mut(index) {
            *choice = Some(match *choice {
                Some(i) => (i + 1) % option_count,
                None => 0,
            });
        }
    }

    pub fn select_prev(&mut self, index: usize, option_count: usize) {
        if option_count == 0 {
            return;
        }
        if let Some(FieldValue::Choice(choice)) = self.values.get_mut(index) {
            *choice = Some(match *choice {
                Some(i) => i.checked_sub(1).unwrap_or(option_count - 1),
                None => option_count - 1,
            });
        }
    }

    pub fn push_char(&mut self, index: usize, c: char) {
        if let Some(FieldValue::Number(text)) = self.values.get_mut(index) {
            if !c.is_control() {
                text.push(c);
            }
        }
    }

    pub fn pop_char(&mut self, index: usize) {
        if let Some(FieldValue::Number(text)) = self.values.get_mut(index) {
            text.pop();
        }
    }

    /// Set a field from raw text (CLI `NAME=VALUE` form)
    pub fn set_text(&mut self, feature: &Feature, index: usize, raw: &str) -> Result<(), FieldError> {
        match self.values.get_mut(index) {
            Some(FieldValue::Number(text)) => {
                *text = raw.to_string();
                Ok(())
            }
            Some(FieldValue::Choice(choice)) => {
                let options = feature.options.as_deref().unwrap_or_default();
                let position = options.iter().position(|o| o == raw).ok_or_else(|| {
                    FieldError::UnknownOption {
                        field: feature.display_name.clone(),
                        input: raw.to_string(),
                    }
                })?;
                *choice = Some(position);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Every field error, in configuration order
    pub fn validate(&self, config: &ModelConfig) -> Vec<FieldError> {
        config
            .features
            .iter()
            .zip(&self.values)
            .filter_map(|(feature, value)| read_value(feature, value).err())
            .collect()
    }

    /// Build the payload, failing on the first invalid field
    pub fn collect(&self, config: &ModelConfig) -> Result<InputData, FieldError> {
        let mut input = InputData::new();
        for (feature, value) in config.features.iter().zip(&self.values) {
            input.insert(feature.name.clone(), read_value(feature, value)?);
        }
        Ok(input)
    }
}

fn read_value(feature: &Feature, value: &FieldValue) -> Result<InputValue, FieldError> {
    let field = || feature.display_name.clone();

    match value {
        FieldValue::Choice(None) => {
            if feature.required {
                Err(FieldError::Required { field: field() })
            } else {
                Ok(InputValue::Null)
            }
        }
        FieldValue::Choice(Some(i)) => feature
            .options
            .as_ref()
            .and_then(|options| options.get(*i))
            .map(|o| InputValue::Text(o.clone()))
            .ok_or_else(|| FieldError::Required { field: field() }),
        FieldValue::Number(text) => {
            let text = text.trim();
            if text.is_empty() {
                return if feature.required {
                    Err(FieldError::Required { field: field() })
                } else {
                    Ok(InputValue::Null)
                };
            }

            let number: f64 = match text.parse() {
                Ok(n) if f64::is_finite(n) => n,
                _ => {
                    return Err(FieldError::NotANumber {
                        field: field(),
                        input: text.to_string(),
                    })
                }
            };

            if let Some(min) = feature.min {
                if number < min {
                    return Err(FieldError::BelowMin { field: field(), min });
                }
            }
            if let Some(max) = feature.max {
                if number > max {
                    return Err(FieldError::AboveMax { field: field(), max });
                }
            }

            Ok(InputValue::Number(number))
        }
    }
}
