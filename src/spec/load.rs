//! Single parse entry point: detect the dialect once, route to the right
//! parser, return the flavor-tagged IR.

use super::rest::{parse_document, parse_rest_document, RestDialect};
use super::soap::parse_soap;
use super::types::{ParseOptions, ParsedSpec, SpecFlavor};
use crate::error::SpecError;

/// Parse raw specification text into the IR with default options.
pub fn parse_spec(text: &str) -> Result<ParsedSpec, SpecError> {
    parse_spec_with(text, &ParseOptions::default())
}

/// Parse raw specification text into the IR.
///
/// XML input is treated as WSDL 1.1; everything else is parsed as
/// JSON/YAML and split into OpenAPI 3.0 vs Swagger 2.0 by the presence of
/// the `openapi` key.
pub fn parse_spec_with(text: &str, opts: &ParseOptions) -> Result<ParsedSpec, SpecError> {
    if text.trim_start().starts_with('<') {
        let (tools, models) = parse_soap(text, opts)?;
        return Ok(ParsedSpec {
            flavor: SpecFlavor::Wsdl11,
            tools,
            models,
        });
    }
    let doc = parse_document(text)?;
    let flavor = RestDialect::detect(&doc).flavor();
    let (tools, models) = parse_rest_document(&doc, opts)?;
    Ok(ParsedSpec {
        flavor,
        tools,
        models,
    })
}

/// Derive a file-safe slug from an API name, used for the generated
/// server's file name.
pub fn api_slug(api_name: &str) -> String {
    let slug: String = api_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "api".to_string()
    } else {
        slug
    }
}
