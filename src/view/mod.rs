//! Declarative description of the whole screen.
//!
//! `render` is a pure function of application state; `ui::draw` applies the
//! resulting `Screen` to the terminal.

use crate::api::ApiStatus;
use crate::form::{FieldValue, FormState};
use crate::model::{FeatureKind, InputData, ModelConfig, PredictionResult};

pub const SUBMIT_LABEL: &str = "Predict";
pub const SUBMITTING_LABEL: &str = "Predicting...";
const DEFAULT_TITLE: &str = "Model Prediction";

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub title: String,
    pub description: String,
    pub status: StatusView,
    pub fields: Vec<FieldView>,
    pub submit: SubmitView,
    pub result: Option<ResultView>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    /// `None` while the first check is still running
    pub connected: Option<bool>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitView {
    pub enabled: bool,
    pub label: &'static str,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub required: bool,
    pub focused: bool,
    pub control: Control,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Select {
        options: Vec<OptionView>,
    },
    /// Step is always unconstrained (fractional input allowed)
    Number {
        text: String,
        placeholder: String,
        min: Option<f64>,
        max: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub disabled: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub value: String,
    pub unit: String,
    /// (display name, submitted value) in configuration order
    pub details: Vec<(String, String)>,
}

impl ResultView {
    pub fn new(result: &PredictionResult, input: &InputData, config: &ModelConfig) -> Self {
        let details = config
            .features
            .iter()
            .map(|f| {
                let value = input.get(&f.name).map(|v| v.to_string()).unwrap_or_default();
                (f.display_name.clone(), value)
            })
            .collect();

        Self {
            value: format_prediction(result.prediction),
            unit: unit_symbol(&result.unit).to_string(),
            details,
        }
    }
}

/// Everything `render` reads
pub struct ViewInput<'a> {
    pub status: &'a ApiStatus,
    pub model: Option<&'a ModelConfig>,
    pub form: &'a FormState,
    pub focus: usize,
    pub submitting: bool,
    pub result: Option<&'a ResultView>,
    pub error: Option<&'a str>,
}

pub fn render(input: &ViewInput<'_>) -> Screen {
    let (title, description) = match input.model {
        Some(config) => (config.model.name.clone(), config.model.description.clone()),
        None => (DEFAULT_TITLE.to_string(), String::new()),
    };

    let status = match input.status {
        ApiStatus::Checking => StatusView { connected: None, label: "Checking API...".to_string() },
        ApiStatus::Connected(_) => StatusView { connected: Some(true), label: "API Connected".to_string() },
        ApiStatus::Disconnected => StatusView { connected: Some(false), label: "API Disconnected".to_string() },
    };

    let fields = input
        .model
        .map(|config| render_fields(config, input.form, input.focus))
        .unwrap_or_default();

    let submit = SubmitView {
        enabled: !input.submitting && input.model.is_some(),
        label: if input.submitting { SUBMITTING_LABEL } else { SUBMIT_LABEL },
        focused: input.model.is_some() && input.focus == fields.len(),
    };

    Screen {
        title,
        description,
        status,
        fields,
        submit,
        result: input.result.cloned(),
        error: input.error.map(str::to_string),
    }
}

/// One label+control pair per feature, in configuration order
pub fn render_fields(config: &ModelConfig, form: &FormState, focus: usize) -> Vec<FieldView> {
    config
        .features
        .iter()
        .enumerate()
        .filter_map(|(i, feature)| {
            let control = match (&feature.kind, form.value(i)?) {
                (FeatureKind::Categorical, FieldValue::Choice(choice)) => {
                    let mut options = vec![OptionView {
                        value: String::new(),
                        label: format!("Select {}", feature.display_name),
                        disabled: true,
                        selected: choice.is_none(),
                    }];
                    options.extend(feature.options.iter().flatten().enumerate().map(|(j, o)| {
                        OptionView {
                            value: o.clone(),
                            label: o.clone(),
                            disabled: false,
                            selected: *choice == Some(j),
                        }
                    }));
                    Control::Select { options }
                }
                (FeatureKind::Numeric, FieldValue::Number(text)) => Control::Number {
                    text: text.clone(),
                    placeholder: format!("Enter {}", feature.display_name),
                    min: feature.min,
                    max: feature.max,
                },
                // FormState::build rejects anything else
                _ => return None,
            };

            Some(FieldView {
                id: feature.name.clone(),
                label: feature.display_name.clone(),
                required: feature.required,
                focused: focus == i,
                control,
            })
        })
        .collect()
}

/// Round half-up and group thousands with commas (en-US style)
pub fn format_prediction(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // Ties go toward +inf; round() alone sends negative ties away from zero
    let nearest = value.round();
    let rounded = if value - nearest == 0.5 { nearest + 1.0 } else { nearest };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn unit_symbol(unit: &str) -> &str {
    match unit {
        "USD" => "$",
        other => other,
    }
}
