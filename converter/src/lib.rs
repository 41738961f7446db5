//! # MDFlow - pasted specs to structured markdown
//!
//! MDFlow turns pasted or uploaded content (spreadsheet selections, CSV
//! exports, block-quoted markdown) into a normalized spec document, checks
//! it against validation rules and renders it as markdown.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌───────────┐     ┌──────────┐     ┌───────────┐
//!               ┌───▶│  Parser   │────▶│  Header  │────▶│  SpecDoc  │──┐
//! ┌──────────┐  │    │ (matrix)  │     │  Mapper  │     │  (rows)   │  │   ┌──────────┐
//! │ Detector │──┤    └───────────┘     └──────────┘     └───────────┘  ├──▶│ Validate │
//! └──────────┘  │    ┌───────────┐                      ┌───────────┐  │   │ + Render │
//!               └───▶│   Prose   │─────────────────────▶│  SpecDoc  │──┘   └──────────┘
//!                    │ extractor │                      │  (prose)  │
//!                    └───────────┘                      └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mdflow::convert_paste;
//!
//! let result = convert_paste("No\tItem Name\tType\n1\tTest Item\ttext", "auto").unwrap();
//! println!("{}", result.mdflow);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Canonical fields, rows and documents
//! - [`parser`] - Delimited text to matrix, byte decoding
//! - [`detect`] - Markdown vs. table classification
//! - [`mapping`] - Header recognition (aliases, fuzzy matching)
//! - [`builder`] - Spec document building
//! - [`validation`] - Rule-based row validation
//! - [`render`] - Markdown templates
//! - [`pipeline`] - End-to-end conversion
//! - [`logs`] - Pipeline log helpers

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Input
pub mod detect;
pub mod parser;

// Structure
pub mod builder;
pub mod mapping;

// Output
pub mod render;
pub mod validation;

pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BuildError, BuildResult, ConfigError, ConvertError, ConvertResult, ParseError, ParseResult,
    RulesError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CanonicalField, ColumnMapping, ExtraColumn, FieldFamily, InputAnalysis, InputType,
    ProseDocument, ProseSection, SpecDoc, SpecRow, TableDoc,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_delimiter, parse, parse_with_delimiter, parse_with_metadata, Delimiter, ParsedMatrix,
    RawMatrix,
};
pub use parser::encoding::{decode_auto, decode_content, detect_encoding, read_file_auto, DecodedInput};

// =============================================================================
// Re-exports - Detection & Mapping
// =============================================================================

pub use detect::{detect_input_type, DetectorConfig, InputDetector};
pub use mapping::{map_headers, AliasTable, HeaderMapper, MapperConfig};

// =============================================================================
// Re-exports - Building
// =============================================================================

pub use builder::{build_spec_doc_from_paste, BuildOutput, SpecDocBuilder};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    validate, CrossFieldRule, FormatRules, ValidationResult, ValidationRules, ValidationWarning,
    WarningCode,
};

// =============================================================================
// Re-exports - Rendering & Pipeline
// =============================================================================

pub use render::{get_template_names, render, Template};
pub use pipeline::{convert_paste, convert_paste_with, ConvertOptions, RenderMeta, RenderResult};
