//! Reference resolution, type mapping, and schema field extraction.
//!
//! These are the flavor-agnostic leaves of the parse pipeline: a `$ref`
//! walker over the raw document tree, a schema → normalized-type mapper,
//! and a [`ModelRegistrar`] that accumulates generated models while
//! deduplicating structurally identical field sets.
//!
//! The normalized type vocabulary targets the generated host language:
//! scalars `str`/`int`/`float`/`bool`, collections `list[T]`, the untyped
//! object marker `dict`, model references by name, and `T | None` for
//! nullable/optional sources.

use super::types::{ModelFields, ModelMap, ParseOptions, UnresolvedRefStyle};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Maximum `$ref`/nesting depth before the mapper degrades to `dict`.
/// Bounds worst-case work on adversarial or cyclic documents.
pub const MAX_REF_DEPTH: usize = 20;

/// The untyped-object marker.
pub const UNTYPED: &str = "dict";

/// Resolve a `#/`-prefixed reference against the full document tree.
///
/// Walks the path segment by segment; any miss yields `None`, never an
/// error. References not starting with `#/` (remote or sibling-file refs)
/// are out of scope and resolve to `None`.
pub fn resolve_ref<'a>(ref_path: &str, document: &'a Value) -> Option<&'a Value> {
    let rest = ref_path.strip_prefix("#/")?;
    let mut current = document;
    for segment in rest.split('/') {
        // JSON pointer escapes: ~1 before ~0
        let segment = segment.replace("~1", "/").replace("~0", "~");
        current = current.as_object()?.get(segment.as_str())?;
    }
    Some(current)
}

/// Map a raw scalar type name to the normalized vocabulary.
///
/// Unknown scalar names default to `str`.
pub fn normalize_type(raw: &str) -> String {
    match raw {
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "array" => "list",
        "object" => UNTYPED,
        // "file" is Swagger 2.0's upload marker; the value travels as a string
        "" | "string" | "file" => "str",
        _ => "str",
    }
    .to_string()
}

/// Turn an arbitrary name into a CamelCase model identifier.
pub fn to_model_name(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let mut out = String::new();
    for part in sanitized.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        "Model".to_string()
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("M{out}")
    } else {
        out
    }
}

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Sanitize a field or tool name into a valid identifier in the generated
/// host language.
pub fn sanitize_identifier(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        s = "_".to_string();
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if PY_KEYWORDS.contains(&s.as_str()) {
        s.push('_');
    }
    s
}

/// Wrap a type as nullable unless it already is.
pub fn optionalize(ty: &str) -> String {
    if ty.ends_with(" | None") {
        ty.to_string()
    } else {
        format!("{ty} | None")
    }
}

/// Strip collection and nullability wrappers down to the innermost type
/// name, e.g. `list[Pet] | None` → `Pet`.
pub fn base_type_name(ty: &str) -> &str {
    let mut current = ty;
    loop {
        let stripped = current.strip_suffix(" | None").unwrap_or(current);
        let stripped = stripped
            .strip_prefix("list[")
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(stripped);
        if stripped == current {
            return current;
        }
        current = stripped;
    }
}

fn last_ref_segment(ref_path: &str) -> Option<&str> {
    ref_path.rsplit('/').find(|s| !s.is_empty() && *s != "#")
}

fn unresolved_ref_type(ref_path: &str, opts: &ParseOptions) -> String {
    match opts.unresolved_ref {
        UnresolvedRefStyle::Opaque => UNTYPED.to_string(),
        UnresolvedRefStyle::LastSegment => match last_ref_segment(ref_path) {
            Some(segment) => to_model_name(segment),
            None => UNTYPED.to_string(),
        },
    }
}

fn type_of(obj: &serde_json::Map<String, Value>) -> Option<&str> {
    match obj.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        // OpenAPI 3.1 type arrays: the non-null entry is the real type
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

fn is_nullable(obj: &serde_json::Map<String, Value>) -> bool {
    if obj.get("nullable").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    matches!(obj.get("type"), Some(Value::Array(items))
        if items.iter().filter_map(Value::as_str).any(|t| t == "null"))
}

/// Map a schema fragment to its normalized type string.
///
/// Pure: never registers models. Rules, in priority order: `$ref` (resolve
/// or fall back per [`UnresolvedRefStyle`]), `array` → `list[T]`, object
/// with properties → the referenced model name (only reachable through a
/// `$ref`; inline objects yield `dict` here, and field extraction registers
/// them), bare/absent type → `dict`, scalars 1:1.
pub fn map_schema_type(schema: &Value, document: &Value, opts: &ParseOptions) -> String {
    map_schema_type_at(schema, document, 0, opts)
}

fn map_schema_type_at(schema: &Value, document: &Value, depth: usize, opts: &ParseOptions) -> String {
    if depth > MAX_REF_DEPTH {
        return UNTYPED.to_string();
    }
    let Some(obj) = schema.as_object() else {
        return UNTYPED.to_string();
    };

    if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str) {
        return match resolve_ref(ref_path, document) {
            Some(resolved) => {
                let named_object = resolved
                    .as_object()
                    .is_some_and(|o| o.contains_key("properties"));
                if named_object {
                    // The resolved target is a record schema; its name is
                    // the reference's own last segment.
                    match last_ref_segment(ref_path) {
                        Some(segment) => to_model_name(segment),
                        None => UNTYPED.to_string(),
                    }
                } else {
                    map_schema_type_at(resolved, document, depth + 1, opts)
                }
            }
            None => unresolved_ref_type(ref_path, opts),
        };
    }

    // oneOf with a null variant maps to Optional of the other variant
    if let Some(one_of) = obj.get("oneOf").and_then(Value::as_array) {
        let mut inner: Option<String> = None;
        let mut has_null = false;
        for variant in one_of {
            if variant.get("type").and_then(Value::as_str) == Some("null") {
                has_null = true;
            } else {
                inner = Some(map_schema_type_at(variant, document, depth + 1, opts));
            }
        }
        let inner = inner.unwrap_or_else(|| UNTYPED.to_string());
        return if has_null { optionalize(&inner) } else { inner };
    }

    let nullable = is_nullable(obj);
    let ty = match type_of(obj) {
        Some("array") => match obj.get("items") {
            Some(items) => format!(
                "list[{}]",
                map_schema_type_at(items, document, depth + 1, opts)
            ),
            None => format!("list[{UNTYPED}]"),
        },
        Some("object") | None => UNTYPED.to_string(),
        Some(scalar) => normalize_type(scalar),
    };
    if nullable {
        optionalize(&ty)
    } else {
        ty
    }
}

/// Accumulates models during one parse run.
///
/// Structurally identical field sets are deduplicated by fingerprint so two
/// operations sharing a payload shape reuse one model; distinct shapes that
/// want the same name are uniquified with a numeric suffix. Insertion order
/// is children-before-parents, which is also the order generated code needs.
#[derive(Debug, Default)]
pub struct ModelRegistrar {
    models: ModelMap,
    by_fingerprint: HashMap<[u8; 32], String>,
    in_progress: HashSet<String>,
}

fn fingerprint(fields: &ModelFields) -> [u8; 32] {
    let mut pairs: Vec<(&String, &String)> = fields.iter().collect();
    pairs.sort();
    let mut hasher = Sha256::new();
    for (name, ty) in pairs {
        hasher.update(name.as_bytes());
        hasher.update([0x1f]);
        hasher.update(ty.as_bytes());
        hasher.update([0x1e]);
    }
    hasher.finalize().into()
}

impl ModelRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn models(&self) -> &ModelMap {
        &self.models
    }

    pub fn into_models(self) -> ModelMap {
        self.models
    }

    fn unique_name(&self, preferred: &str) -> String {
        if !self.models.contains_key(preferred) {
            return preferred.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{preferred}{counter}");
            if !self.models.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Register a field set under a preferred name, reusing an existing
    /// structurally identical model when one exists.
    pub fn register(&mut self, preferred: &str, fields: ModelFields) -> String {
        let fp = fingerprint(&fields);
        if let Some(existing) = self.by_fingerprint.get(&fp) {
            return existing.clone();
        }
        let name = self.unique_name(preferred);
        self.models.insert(name.clone(), fields);
        self.by_fingerprint.insert(fp, name.clone());
        name
    }

    /// Register without fingerprint dedup. Used for placeholder
    /// request/response models, which each tool keeps for itself.
    pub fn register_unique(&mut self, preferred: &str, fields: ModelFields) -> String {
        let name = self.unique_name(preferred);
        self.models.insert(name.clone(), fields);
        name
    }
}

/// Extract a body/message schema's fields, registering nested object
/// schemas (inline `properties` objects and resolved `$ref`s) as their own
/// models referenced by name.
///
/// Field names are sanitized for generated-code validity. Fields absent
/// from the schema's `required` list are rendered nullable.
pub fn extract_schema_fields(
    schema: &Value,
    document: &Value,
    registrar: &mut ModelRegistrar,
    opts: &ParseOptions,
) -> ModelFields {
    extract_fields_at(schema, document, registrar, 0, opts)
}

fn extract_fields_at(
    schema: &Value,
    document: &Value,
    registrar: &mut ModelRegistrar,
    depth: usize,
    opts: &ParseOptions,
) -> ModelFields {
    let mut fields = ModelFields::new();
    if depth > MAX_REF_DEPTH {
        return fields;
    }
    let Some(obj) = schema.as_object() else {
        return fields;
    };

    if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str) {
        return match resolve_ref(ref_path, document) {
            Some(resolved) => extract_fields_at(resolved, document, registrar, depth + 1, opts),
            None => fields,
        };
    }

    let required: HashSet<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(props) = obj.get("properties").and_then(Value::as_object) else {
        return fields;
    };
    for (name, prop) in props {
        let ty = field_type(name, prop, document, registrar, depth, opts);
        let ty = if required.contains(name.as_str()) {
            ty
        } else {
            optionalize(&ty)
        };
        fields.insert(sanitize_identifier(name), ty);
    }
    fields
}

/// Map one property to its field type, registering nested models.
fn field_type(
    field_name: &str,
    prop: &Value,
    document: &Value,
    registrar: &mut ModelRegistrar,
    depth: usize,
    opts: &ParseOptions,
) -> String {
    if depth > MAX_REF_DEPTH {
        return UNTYPED.to_string();
    }
    let Some(obj) = prop.as_object() else {
        return UNTYPED.to_string();
    };

    if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str) {
        return match resolve_ref(ref_path, document) {
            Some(resolved) => {
                let preferred = last_ref_segment(ref_path).unwrap_or(field_name);
                register_schema_model(preferred, resolved, document, registrar, depth, opts)
            }
            None => unresolved_ref_type(ref_path, opts),
        };
    }

    if let Some(one_of) = obj.get("oneOf").and_then(Value::as_array) {
        let mut inner: Option<String> = None;
        let mut has_null = false;
        for variant in one_of {
            if variant.get("type").and_then(Value::as_str) == Some("null") {
                has_null = true;
            } else {
                inner = Some(field_type(field_name, variant, document, registrar, depth + 1, opts));
            }
        }
        let inner = inner.unwrap_or_else(|| UNTYPED.to_string());
        return if has_null { optionalize(&inner) } else { inner };
    }

    let nullable = is_nullable(obj);
    let ty = match type_of(obj) {
        Some("array") => match obj.get("items") {
            Some(items) => format!(
                "list[{}]",
                field_type(field_name, items, document, registrar, depth + 1, opts)
            ),
            None => format!("list[{UNTYPED}]"),
        },
        Some("object") | None => {
            if obj.get("properties").is_some() {
                register_schema_model(field_name, prop, document, registrar, depth, opts)
            } else {
                UNTYPED.to_string()
            }
        }
        Some(scalar) => normalize_type(scalar),
    };
    if nullable {
        optionalize(&ty)
    } else {
        ty
    }
}

/// Register an object schema as a named model and return the name the
/// field should reference. Self-referential schemas terminate through the
/// in-progress guard; empty schemas degrade to `dict`.
pub(crate) fn register_schema_model(
    preferred: &str,
    schema: &Value,
    document: &Value,
    registrar: &mut ModelRegistrar,
    depth: usize,
    opts: &ParseOptions,
) -> String {
    let model_name = to_model_name(preferred);
    if registrar.models.contains_key(&model_name) || registrar.in_progress.contains(&model_name) {
        return model_name;
    }
    registrar.in_progress.insert(model_name.clone());
    let fields = extract_fields_at(schema, document, registrar, depth + 1, opts);
    registrar.in_progress.remove(&model_name);
    if fields.is_empty() {
        return UNTYPED.to_string();
    }
    registrar.register(&model_name, fields)
}
