//! Typed error kinds for the parse and generation boundaries.
//!
//! Parsing distinguishes two failure classes: the input text is not one of
//! the supported serializations at all ([`SpecError::Format`]), or it parsed
//! but a required structural anchor is absent ([`SpecError::Validation`]).
//! Unresolved `$ref`s are never an error; they degrade to fallback types in
//! the type mapper. Generation errors indicate internal-consistency bugs or
//! an ambiguous tool set, not bad user input.

use thiserror::Error;

/// Errors produced while turning raw specification text into the tool IR.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The input parses as neither JSON, YAML, nor well-formed XML.
    #[error("spec format error: {0}")]
    Format(String),
    /// Structurally parseable, but a required anchor is missing.
    ///
    /// `anchor` names the missing field/element; `help` shows the expected
    /// shape so a human can fix the input.
    #[error("spec validation error: missing `{anchor}`: {help}")]
    Validation { anchor: String, help: String },
}

impl SpecError {
    pub fn missing(anchor: impl Into<String>, help: impl Into<String>) -> Self {
        SpecError::Validation {
            anchor: anchor.into(),
            help: help.into(),
        }
    }
}

/// Errors produced while rendering the IR into server source text.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A tool references a model that is not present in the model map.
    /// The registry guarantees this cannot reach the template layer.
    #[error("tool `{tool}` references model `{model}` which is not in the model map")]
    MissingModel { tool: String, model: String },
    /// The tool set mixes protocols; the dispatcher refuses rather than
    /// silently dropping a subset. Split the list and generate twice.
    #[error("tool set mixes {rest} REST and {soap} SOAP tools; generate each subset separately")]
    MixedToolKinds { rest: usize, soap: usize },
    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

/// Errors from prompt validation and linking.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The prompt text uses a `{placeholder}` not declared in its arguments.
    #[error("prompt `{prompt}` uses placeholder `{{{placeholder}}}` which is not declared in its arguments")]
    UnknownPlaceholder { prompt: String, placeholder: String },
}
