use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Which of the three supported input dialects a document uses.
///
/// Resolved exactly once at the parse entry point; everything downstream of
/// the parsers is flavor-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFlavor {
    OpenApi3,
    Swagger2,
    Wsdl11,
}

impl std::fmt::Display for SpecFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecFlavor::OpenApi3 => write!(f, "OpenAPI 3.0"),
            SpecFlavor::Swagger2 => write!(f, "Swagger 2.0"),
            SpecFlavor::Wsdl11 => write!(f, "WSDL 1.1"),
        }
    }
}

/// Authentication mechanism attached to a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthKind {
    #[default]
    None,
    BearerToken,
    ApiKeyHeader,
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthKind::None => write!(f, "None"),
            AuthKind::BearerToken => write!(f, "Bearer Token"),
            AuthKind::ApiKeyHeader => write!(f, "API Key (Header)"),
        }
    }
}

/// SOAP binding style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapStyle {
    Document,
    Rpc,
}

impl std::fmt::Display for SoapStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoapStyle::Document => write!(f, "document"),
            SoapStyle::Rpc => write!(f, "rpc"),
        }
    }
}

/// SOAP-only tool metadata. Its presence on a [`ToolMeta`] is the single
/// discriminant between REST and SOAP tools; an empty `action` string is
/// still a SOAP tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapMeta {
    /// SOAPAction URI from the binding operation; may be empty.
    pub action: String,
    pub style: SoapStyle,
    /// Target namespace of the WSDL definitions.
    pub namespace: String,
}

/// Ordered field name → normalized type mapping for one generated model.
pub type ModelFields = IndexMap<String, String>;

/// Flat, ordered model name → fields mapping. Models referenced by other
/// models are inserted before their referents so generated code can define
/// types before use.
pub type ModelMap = IndexMap<String, ModelFields>;

/// One callable operation extracted from a specification.
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// Generated function name; always a valid identifier.
    pub name: String,
    /// Full URL template with `{param}` placeholders (REST) or the SOAP
    /// endpoint address.
    pub url: String,
    /// Upper-case HTTP verb, or the SOAP operation name.
    pub method: String,
    pub auth: AuthKind,
    /// Environment variable holding the credential; `Some` iff `auth` is
    /// not `None`.
    pub auth_env_var: Option<String>,
    /// Ordered parameter name → normalized type. Path parameters first,
    /// then query/header in declaration order, then the `body` argument.
    pub args: IndexMap<String, String>,
    pub body_model: Option<String>,
    pub response_model: Option<String>,
    /// Any body field carries binary/multipart content.
    pub has_file_fields: bool,
    /// The operation declares query parameters.
    pub has_query_params: bool,
    pub description: String,
    /// `Some` exactly when this is a SOAP tool.
    pub soap: Option<SoapMeta>,
}

static PATH_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("path parameter pattern"));

impl ToolMeta {
    pub fn is_soap(&self) -> bool {
        self.soap.is_some()
    }

    /// Names of all `{name}` placeholders in the URL template, in order.
    pub fn path_params(&self) -> Vec<String> {
        scan_path_params(&self.url)
    }
}

/// Scan a URL template for `{name}` placeholders.
pub(crate) fn scan_path_params(url: &str) -> Vec<String> {
    PATH_PARAM_RE
        .captures_iter(url)
        .map(|c| c[1].to_string())
        .collect()
}

/// One prompt template record, produced by an external generator and only
/// validated/linked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMeta {
    /// Matches a tool name for auto-linking.
    pub name: String,
    /// Comma-joined parameter names.
    pub args: String,
    /// Template text; `{arg}` placeholders must name entries of `args`.
    pub text: String,
    pub description: String,
}

/// How the type mapper names schemas behind unresolvable `$ref`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedRefStyle {
    /// Best-effort: the reference's last path segment becomes the model
    /// name. Two different unresolved refs can collide onto one name.
    #[default]
    LastSegment,
    /// Collision-free: every unresolved reference maps to the untyped
    /// object marker.
    Opaque,
}

/// Knobs threaded through a parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub unresolved_ref: UnresolvedRefStyle,
}

/// Result of parsing one specification document.
#[derive(Debug, Clone)]
pub struct ParsedSpec {
    pub flavor: SpecFlavor,
    pub tools: Vec<ToolMeta>,
    pub models: ModelMap,
}
