//! Specification parsing: raw OpenAPI/Swagger/WSDL text → `(tools, models)` IR.

mod load;
mod resolve;
mod rest;
mod soap;
mod types;

pub use load::{api_slug, parse_spec, parse_spec_with};
pub use resolve::{
    base_type_name, extract_schema_fields, map_schema_type, normalize_type, resolve_ref,
    sanitize_identifier, to_model_name, ModelRegistrar, MAX_REF_DEPTH, UNTYPED,
};
pub use rest::{parse_rest, parse_rest_document, RestDialect};
pub use soap::parse_soap;
pub use types::{
    AuthKind, ModelFields, ModelMap, ParseOptions, ParsedSpec, PromptMeta, SoapMeta, SoapStyle,
    SpecFlavor, ToolMeta, UnresolvedRefStyle,
};
