//! OpenAPI 3.0 / Swagger 2.0 parser.
//!
//! Both dialects share a conceptual model (paths × methods × parameters ×
//! schemas) but diverge on where the base URL lives, what the security
//! scheme section is called, and where request bodies are declared. The
//! divergence is captured once in [`RestDialect`]; everything else runs on
//! the raw document tree through the shared resolver/mapper.

use super::resolve::{
    extract_schema_fields, map_schema_type, normalize_type, resolve_ref, sanitize_identifier,
    to_model_name, ModelRegistrar,
};
use super::types::{
    scan_path_params, AuthKind, ModelFields, ModelMap, ParseOptions, SpecFlavor, ToolMeta,
};
use crate::error::SpecError;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

/// Parse raw text as JSON first, then YAML. The document root must be a
/// mapping; YAML would otherwise happily accept arbitrary prose as a
/// scalar.
pub(crate) fn parse_document(text: &str) -> Result<Value, SpecError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(json_err) => match serde_yaml::from_str(text) {
            Ok(v) => v,
            Err(yaml_err) => {
                return Err(SpecError::Format(format!(
                    "input is neither valid JSON ({json_err}) nor valid YAML ({yaml_err})"
                )))
            }
        },
    };
    if !value.is_object() {
        return Err(SpecError::Format(
            "expected a JSON/YAML mapping at the document root".to_string(),
        ));
    }
    Ok(value)
}

/// REST dialect, resolved once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestDialect {
    OpenApi3,
    Swagger2,
}

impl RestDialect {
    pub fn detect(doc: &Value) -> Self {
        if doc.get("openapi").is_some() {
            RestDialect::OpenApi3
        } else {
            RestDialect::Swagger2
        }
    }

    pub fn flavor(self) -> SpecFlavor {
        match self {
            RestDialect::OpenApi3 => SpecFlavor::OpenApi3,
            RestDialect::Swagger2 => SpecFlavor::Swagger2,
        }
    }

    /// Resolve the base URL. The result always carries a host; a spec must
    /// not silently produce a URL with an empty authority component.
    fn extract_base_url(self, doc: &Value) -> Result<String, SpecError> {
        match self {
            RestDialect::OpenApi3 => {
                let servers = doc
                    .get("servers")
                    .and_then(Value::as_array)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        SpecError::missing(
                            "servers",
                            "OpenAPI 3.0 requires at least one server, e.g. \
                             \"servers\": [{\"url\": \"https://api.example.com/v1\"}]",
                        )
                    })?;
                let url = servers[0].get("url").and_then(Value::as_str).unwrap_or("");
                if url.is_empty() {
                    return Err(SpecError::missing(
                        "servers",
                        "the first server object has an empty \"url\"; provide e.g. \
                         \"servers\": [{\"url\": \"https://api.example.com/v1\"}]",
                    ));
                }
                let parsed = url::Url::parse(url).map_err(|e| {
                    SpecError::missing(
                        "servers",
                        format!("the first server URL `{url}` is not absolute: {e}"),
                    )
                })?;
                if parsed.host_str().is_none() {
                    return Err(SpecError::missing(
                        "servers",
                        format!("the first server URL `{url}` has no host"),
                    ));
                }
                Ok(url.trim_end_matches('/').to_string())
            }
            RestDialect::Swagger2 => {
                let host = doc.get("host").and_then(Value::as_str).unwrap_or("");
                if host.is_empty() {
                    return Err(SpecError::missing(
                        "host",
                        "add the API host, e.g. \"host\": \"api.example.com\"",
                    ));
                }
                let schemes = doc
                    .get("schemes")
                    .and_then(Value::as_array)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        SpecError::missing(
                            "schemes",
                            "specify the protocol scheme, e.g. \"schemes\": [\"https\"]",
                        )
                    })?;
                let scheme = schemes[0].as_str().unwrap_or("https");
                let base_path = doc
                    .get("basePath")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        SpecError::missing(
                            "basePath",
                            "add the base path, e.g. \"basePath\": \"/v1\" \
                             (use \"/\" when the API has no version path)",
                        )
                    })?;
                let base_path = base_path.trim_end_matches('/');
                Ok(format!("{scheme}://{host}{base_path}"))
            }
        }
    }

    fn security_definitions(self, doc: &Value) -> Option<&serde_json::Map<String, Value>> {
        match self {
            RestDialect::OpenApi3 => doc
                .get("components")?
                .get("securitySchemes")?
                .as_object(),
            RestDialect::Swagger2 => doc.get("securityDefinitions")?.as_object(),
        }
    }
}

#[derive(Debug, Clone)]
struct AuthScheme {
    kind: AuthKind,
    env_var: String,
}

fn env_var_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn collect_auth_schemes(dialect: RestDialect, doc: &Value) -> IndexMap<String, AuthScheme> {
    let mut out = IndexMap::new();
    let Some(defs) = dialect.security_definitions(doc) else {
        return out;
    };
    for (name, scheme) in defs {
        match scheme.get("type").and_then(Value::as_str).unwrap_or("") {
            "http" if scheme.get("scheme").and_then(Value::as_str) == Some("bearer") => {
                out.insert(
                    name.clone(),
                    AuthScheme {
                        kind: AuthKind::BearerToken,
                        env_var: format!("{}_TOKEN", env_var_name(name)),
                    },
                );
            }
            "apiKey" => {
                // only header-borne API keys are supported downstream
                if scheme.get("in").and_then(Value::as_str).unwrap_or("header") != "header" {
                    continue;
                }
                let header = scheme.get("name").and_then(Value::as_str).unwrap_or(name);
                out.insert(
                    name.clone(),
                    AuthScheme {
                        kind: AuthKind::ApiKeyHeader,
                        env_var: env_var_name(header),
                    },
                );
            }
            _ => {}
        }
    }
    out
}

/// Resolve the auth mechanism for one operation: explicit `security`
/// requirements (operation-level, else document-level) win; with no
/// requirements declared anywhere, the last declared scheme applies.
fn auth_for_operation(
    op: &Value,
    doc: &Value,
    schemes: &IndexMap<String, AuthScheme>,
) -> (AuthKind, Option<String>) {
    let requirements = op
        .get("security")
        .or_else(|| doc.get("security"))
        .and_then(Value::as_array);
    if let Some(reqs) = requirements {
        for req in reqs {
            if let Some(req_obj) = req.as_object() {
                for key in req_obj.keys() {
                    if let Some(scheme) = schemes.get(key) {
                        return (scheme.kind, Some(scheme.env_var.clone()));
                    }
                }
            }
        }
        return (AuthKind::None, None);
    }
    match schemes.values().last() {
        Some(scheme) => (scheme.kind, Some(scheme.env_var.clone())),
        None => (AuthKind::None, None),
    }
}

fn resolved_param<'a>(param: &'a Value, doc: &'a Value) -> Option<&'a Value> {
    match param.get("$ref").and_then(Value::as_str) {
        Some(ref_path) => resolve_ref(ref_path, doc),
        None => Some(param),
    }
}

fn parameter_type(param: &Value, doc: &Value, opts: &ParseOptions) -> String {
    if let Some(schema) = param.get("schema") {
        return map_schema_type(schema, doc, opts);
    }
    // Swagger 2.0 carries the type on the parameter itself
    if param.get("type").and_then(Value::as_str) == Some("array") && param.get("items").is_some() {
        return map_schema_type(param, doc, opts);
    }
    normalize_type(param.get("type").and_then(Value::as_str).unwrap_or(""))
}

/// Pick the request-body schema from an OpenAPI 3.0 `requestBody`,
/// preferring `application/json` and falling back to the first declared
/// content type. Returns the schema and whether the content is multipart.
fn openapi_body_schema(request_body: &Value) -> Option<(&Value, bool)> {
    let content = request_body.get("content")?.as_object()?;
    if let Some(media) = content.get("application/json") {
        if let Some(schema) = media.get("schema") {
            return Some((schema, false));
        }
    }
    let (media_type, media) = content.iter().next()?;
    let multipart =
        media_type.starts_with("multipart/") || media_type == "application/octet-stream";
    media.get("schema").map(|s| (s, multipart))
}

fn schema_has_binary(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| {
            props.values().any(|p| {
                p.get("format").and_then(Value::as_str) == Some("binary")
                    || p.get("type").and_then(Value::as_str) == Some("file")
            })
        })
}

/// Successful-response schema: 200/201/202/204 in that order, JSON first.
fn extract_response_schema(dialect: RestDialect, op: &Value) -> Option<&Value> {
    let responses = op.get("responses")?.as_object()?;
    for status in ["200", "201", "202", "204"] {
        let Some(resp) = responses.get(status) else {
            continue;
        };
        match dialect {
            RestDialect::OpenApi3 => {
                if let Some(content) = resp.get("content").and_then(Value::as_object) {
                    if let Some(schema) = content
                        .get("application/json")
                        .and_then(|media| media.get("schema"))
                    {
                        return Some(schema);
                    }
                    if let Some(schema) =
                        content.values().next().and_then(|media| media.get("schema"))
                    {
                        return Some(schema);
                    }
                }
            }
            RestDialect::Swagger2 => {
                if let Some(schema) = resp.get("schema") {
                    return Some(schema);
                }
            }
        }
    }
    None
}

fn placeholder_fields() -> ModelFields {
    let mut fields = ModelFields::new();
    fields.insert("data".to_string(), "dict".to_string());
    fields
}

fn resource_model_name(tool_name: &str) -> String {
    let segment = tool_name.rsplit('_').next().unwrap_or(tool_name);
    to_model_name(segment)
}

/// Parse an OpenAPI 3.0 or Swagger 2.0 document into `(tools, models)`.
pub fn parse_rest(text: &str, opts: &ParseOptions) -> Result<(Vec<ToolMeta>, ModelMap), SpecError> {
    let doc = parse_document(text)?;
    parse_rest_document(&doc, opts)
}

/// Parse an already-loaded document tree.
pub fn parse_rest_document(
    doc: &Value,
    opts: &ParseOptions,
) -> Result<(Vec<ToolMeta>, ModelMap), SpecError> {
    let dialect = RestDialect::detect(doc);
    debug!(dialect = %dialect.flavor(), "parsing REST specification");
    let base_url = dialect.extract_base_url(doc)?;
    let schemes = collect_auth_schemes(dialect, doc);
    let mut registrar = ModelRegistrar::new();
    let mut tools = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    if let Some(paths) = doc.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let Some(item_obj) = item.as_object() else {
                continue;
            };
            let item_params: Vec<&Value> = item_obj
                .get("parameters")
                .and_then(Value::as_array)
                .map(|a| a.iter().collect())
                .unwrap_or_default();
            for (method, op) in item_obj {
                let method_lower = method.to_ascii_lowercase();
                if !METHODS.contains(&method_lower.as_str()) || !op.is_object() {
                    continue;
                }
                let mut tool = build_tool(
                    dialect,
                    doc,
                    path,
                    &method_lower,
                    op,
                    &item_params,
                    &base_url,
                    &schemes,
                    &mut registrar,
                    opts,
                );
                if !seen_names.insert(tool.name.clone()) {
                    let mut counter = 2;
                    let renamed = loop {
                        let candidate = format!("{}_{}", tool.name, counter);
                        if seen_names.insert(candidate.clone()) {
                            break candidate;
                        }
                        counter += 1;
                    };
                    warn!(original = %tool.name, renamed = %renamed, "duplicate tool name");
                    tool.name = renamed;
                }
                tools.push(tool);
            }
        }
    }
    Ok((tools, registrar.into_models()))
}

#[allow(clippy::too_many_arguments)]
fn build_tool(
    dialect: RestDialect,
    doc: &Value,
    path: &str,
    method_lower: &str,
    op: &Value,
    item_params: &[&Value],
    base_url: &str,
    schemes: &IndexMap<String, AuthScheme>,
    registrar: &mut ModelRegistrar,
    opts: &ParseOptions,
) -> ToolMeta {
    let method_upper = method_lower.to_ascii_uppercase();
    let name = op
        .get("operationId")
        .and_then(Value::as_str)
        .map(sanitize_identifier)
        .unwrap_or_else(|| {
            let slug = path.trim_matches('/').replace('/', "_").replace(['{', '}'], "");
            sanitize_identifier(&format!("{method_lower}_{slug}"))
        });

    let mut path_args: IndexMap<String, String> = IndexMap::new();
    let mut other_args: IndexMap<String, String> = IndexMap::new();
    let mut body_fields = ModelFields::new();
    let mut has_body = false;
    let mut has_query_params = false;
    let mut body_has_file = false;

    let op_params: Vec<&Value> = op
        .get("parameters")
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    for param in item_params.iter().chain(op_params.iter()) {
        let Some(param) = resolved_param(param, doc) else {
            continue;
        };
        match param.get("in").and_then(Value::as_str).unwrap_or("") {
            location @ ("path" | "query" | "header") => {
                let Some(p_name) = param.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let ty = parameter_type(param, doc, opts);
                let key = sanitize_identifier(p_name);
                if location == "path" {
                    path_args.insert(key, ty);
                } else {
                    if location == "query" {
                        has_query_params = true;
                    }
                    other_args.insert(key, ty);
                }
            }
            "body" => {
                // Swagger 2.0 body parameter
                has_body = true;
                if let Some(schema) = param.get("schema") {
                    body_fields = extract_schema_fields(schema, doc, registrar, opts);
                }
            }
            "formData" => {
                has_body = true;
                let Some(p_name) = param.get("name").and_then(Value::as_str) else {
                    continue;
                };
                if param.get("type").and_then(Value::as_str) == Some("file") {
                    body_has_file = true;
                }
                body_fields.insert(sanitize_identifier(p_name), parameter_type(param, doc, opts));
            }
            _ => {}
        }
    }

    if dialect == RestDialect::OpenApi3 {
        if let Some(request_body) = op.get("requestBody") {
            has_body = true;
            if let Some((schema, multipart)) = openapi_body_schema(request_body) {
                body_fields = extract_schema_fields(schema, doc, registrar, opts);
                if multipart || schema_has_binary(schema) {
                    body_has_file = true;
                }
            }
        }
    }

    let mut body_model = None;
    if has_body {
        let model = if body_fields.is_empty() {
            // a propertyless body still records "this call sends a body"
            registrar.register_unique(&format!("{}Request", to_model_name(&name)), placeholder_fields())
        } else {
            registrar.register(&resource_model_name(&name), body_fields.clone())
        };
        body_model = Some(model);
    }

    let mut response_model = None;
    if let Some(schema) = extract_response_schema(dialect, op)
        .filter(|s| s.as_object().is_some_and(|o| !o.is_empty()))
    {
        let fields = extract_schema_fields(schema, doc, registrar, opts);
        let model = if fields.is_empty() {
            registrar
                .register_unique(&format!("{}Response", to_model_name(&name)), placeholder_fields())
        } else {
            registrar.register(&resource_model_name(&name), fields)
        };
        response_model = Some(model);
    }

    let mut url = format!("{base_url}{path}");
    let mut args: IndexMap<String, String> = IndexMap::new();
    args.extend(path_args);
    // Placeholders present in the template but never declared as
    // parameters are back-filled as strings, so the path-parameter
    // closure holds by construction. Non-identifier placeholder names are
    // rewritten in the template to their sanitized form.
    for raw in scan_path_params(&url) {
        let key = sanitize_identifier(&raw);
        if key != raw {
            url = url.replace(&format!("{{{raw}}}"), &format!("{{{key}}}"));
        }
        args.entry(key).or_insert_with(|| "str".to_string());
    }
    args.extend(other_args);
    if let Some(model) = &body_model {
        args.insert("body".to_string(), model.clone());
    }

    let has_file_fields = body_model.is_some() && (body_has_file || body_fields.contains_key("file"));
    let (auth, auth_env_var) = auth_for_operation(op, doc, schemes);
    let description = op
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{method_upper} {path}"));

    ToolMeta {
        name,
        url,
        method: method_upper,
        auth,
        auth_env_var,
        args,
        body_model,
        response_model,
        has_file_fields,
        has_query_params,
        description,
        soap: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_dialect() {
        assert_eq!(
            RestDialect::detect(&json!({"openapi": "3.0.0"})),
            RestDialect::OpenApi3
        );
        assert_eq!(
            RestDialect::detect(&json!({"swagger": "2.0"})),
            RestDialect::Swagger2
        );
    }

    #[test]
    fn test_parse_document_rejects_prose() {
        let err = parse_document("just some words").unwrap_err();
        assert!(matches!(err, SpecError::Format(_)));
    }

    #[test]
    fn test_swagger_base_url_composition() {
        let doc = json!({
            "swagger": "2.0",
            "host": "api.example.com",
            "schemes": ["https"],
            "basePath": "/v1"
        });
        let url = RestDialect::Swagger2.extract_base_url(&doc).unwrap();
        assert_eq!(url, "https://api.example.com/v1");
    }

    #[test]
    fn test_env_var_name_is_shell_safe() {
        assert_eq!(env_var_name("X-API-Key"), "X_API_KEY");
        assert_eq!(env_var_name("petstore_auth"), "PETSTORE_AUTH");
    }
}
