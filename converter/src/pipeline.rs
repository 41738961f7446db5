//! High-level conversion API: pasted content to rendered markdown.
//!
//! Composes classification, building, validation and rendering:
//!
//! 1. Build the spec document (classifier, parser, header mapper)
//! 2. Validate rows (supplied rules, else a preset picked from the rows)
//! 3. Render with the requested template
//!
//! # Example
//!
//! ```rust,ignore
//! use mdflow::convert_paste;
//!
//! let result = convert_paste("ID\tScenario\tExpected\nTC-01\tLogin\tDashboard", "spec")?;
//! println!("{}", result.mdflow);
//! for warning in &result.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::builder::SpecDocBuilder;
use crate::detect::{DetectorConfig, InputDetector};
use crate::error::{ConfigError, ConvertError, ConvertResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::mapping::{HeaderMapper, MapperConfig};
use crate::models::{ColumnMapping, InputType, SpecDoc};
use crate::render::{render, Template, AUTO_TEMPLATE};
use crate::validation::{validate, ValidationResult, ValidationRules};

pub const ENV_MIN_HEADER_CONFIDENCE: &str = "MDFLOW_MIN_HEADER_CONFIDENCE";
pub const ENV_TABLE_RATIO: &str = "MDFLOW_TABLE_RATIO";
pub const ENV_TEMPLATE: &str = "MDFLOW_TEMPLATE";
pub const ENV_RULES_PRESET: &str = "MDFLOW_RULES_PRESET";

/// Options for a conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub detector: DetectorConfig,
    pub mapper: MapperConfig,
    /// Rules to validate with. `None` picks a preset from the rows.
    pub rules: Option<ValidationRules>,
    /// Template name, or `auto`.
    pub template: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            mapper: MapperConfig::default(),
            rules: None,
            template: AUTO_TEMPLATE.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Defaults overridden by `MDFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConvertOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_MIN_HEADER_CONFIDENCE) {
            let confidence: u8 = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_MIN_HEADER_CONFIDENCE, &value, "expected an integer"))?;
            if confidence > 100 {
                return Err(invalid(ENV_MIN_HEADER_CONFIDENCE, &value, "must be 0..=100"));
            }
            options.mapper.min_confidence = confidence;
        }

        if let Some(value) = get(ENV_TABLE_RATIO) {
            let ratio: f64 = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_TABLE_RATIO, &value, "expected a number"))?;
            if !(0.0..1.0).contains(&ratio) {
                return Err(invalid(ENV_TABLE_RATIO, &value, "must be in [0, 1)"));
            }
            options.detector.table_ratio_threshold = ratio;
        }

        if let Some(value) = get(ENV_TEMPLATE) {
            let name = value.trim();
            if !name.eq_ignore_ascii_case(AUTO_TEMPLATE) && name.parse::<Template>().is_err() {
                return Err(invalid(ENV_TEMPLATE, &value, "unknown template"));
            }
            options.template = name.to_lowercase();
        }

        if let Some(value) = get(ENV_RULES_PRESET) {
            let rules = ValidationRules::preset(value.trim())
                .map_err(|_| invalid(ENV_RULES_PRESET, &value, "unknown preset"))?;
            options.rules = Some(rules);
        }

        Ok(options)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = Some(rules);
        self
    }
}

fn invalid(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Conversion metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMeta {
    pub input_type: InputType,
    pub confidence: u8,
    pub reason: String,
    pub template: Template,
    pub row_count: usize,
    pub mapped_columns: usize,
    pub extra_columns: usize,
    pub dropped_rows: usize,
    pub column_mappings: Vec<ColumnMapping>,
    pub validation: ValidationResult,
}

/// Result of a conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// Rendered markdown.
    pub mdflow: String,
    /// Human-readable warnings (validation and mapping notes).
    pub warnings: Vec<String>,
    pub meta: RenderMeta,
    /// The document that was rendered.
    pub doc: SpecDoc,
}

/// Rule set used when the caller supplied none.
pub fn default_rules_for(doc: &SpecDoc) -> Option<ValidationRules> {
    let table = doc.as_table()?;
    let preset = if table.is_ui_spec() { "ui-spec" } else { "test-case" };
    ValidationRules::preset(preset).ok()
}

/// Convert pasted content with a template name (`auto` allowed).
pub fn convert_paste(content: &str, template_name: &str) -> ConvertResult<RenderResult> {
    convert_paste_with(content, &ConvertOptions::default().with_template(template_name))
}

/// Convert pasted content with explicit options.
pub fn convert_paste_with(content: &str, options: &ConvertOptions) -> ConvertResult<RenderResult> {
    let builder = SpecDocBuilder::new(
        InputDetector::new(options.detector),
        HeaderMapper::new(options.mapper),
    );

    let built = builder.build_with_details(content).map_err(|e| {
        log_error(format!("Conversion failed: {}", e));
        ConvertError::from(e)
    })?;
    let doc = built.doc;

    let template = Template::resolve(&options.template, &doc)
        .ok_or_else(|| ConvertError::UnknownTemplate(options.template.clone()))?;

    let fallback_rules;
    let rules = match &options.rules {
        Some(rules) => Some(rules),
        None => {
            fallback_rules = default_rules_for(&doc);
            fallback_rules.as_ref()
        }
    };
    let validation = validate(Some(&doc), rules);
    if validation.valid {
        log_success(format!("Validation passed ({} warnings)", validation.warnings.len()));
    } else {
        log_warning(format!("Validation failed ({} warnings)", validation.warnings.len()));
    }

    let mut warnings: Vec<String> = validation.warnings.iter().map(|w| w.to_string()).collect();
    match &doc {
        SpecDoc::Table(table) => {
            if table.positional_fallback {
                warnings.push(
                    "No column header recognized; columns were assigned by position".to_string(),
                );
            }
            if !table.extra_columns.is_empty() {
                let names: Vec<&str> =
                    table.extra_columns.iter().map(|c| c.header.as_str()).collect();
                warnings.push(format!(
                    "{} unmapped columns kept as extras: {}",
                    names.len(),
                    names.join(", ")
                ));
            }
        }
        SpecDoc::Prose(prose) if prose.sections.is_empty() => {
            warnings.push("No block-quote headings found; content kept as raw message".to_string());
        }
        SpecDoc::Prose(_) => {}
    }

    log_info(format!("Rendering with template '{}'", template.name()));
    let mdflow = render(&doc, template);

    let (mapped_columns, extra_columns, column_mappings) = match &doc {
        SpecDoc::Table(table) => (table.columns.len(), table.extra_columns.len(), table.columns.clone()),
        SpecDoc::Prose(_) => (0, 0, Vec::new()),
    };

    let meta = RenderMeta {
        input_type: built.analysis.input_type,
        confidence: built.analysis.confidence,
        reason: built.analysis.reason,
        template,
        row_count: doc.rows().len(),
        mapped_columns,
        extra_columns,
        dropped_rows: built.dropped_rows,
        column_mappings,
        validation,
    };

    Ok(RenderResult { mdflow, warnings, meta, doc })
}

/// Load a rule set from a preset name or JSON text. JSON wins over a preset.
pub fn load_rules(preset: Option<&str>, json: Option<&str>) -> ConvertResult<Option<ValidationRules>> {
    let rules = match (preset, json) {
        (_, Some(json)) => ValidationRules::from_json(json)?,
        (Some(name), None) => ValidationRules::preset(name)?,
        (None, None) => return Ok(None),
    };
    Ok(Some(rules))
}
