//! WSDL 1.1 parser.
//!
//! Maps the WSDL structural model (binding → operation → portType →
//! message → XSD schema) onto the same `(tools, models)` IR the REST
//! parser produces, so one generator layer can consume both. Element
//! lookups are fully namespace-aware: `roxmltree` resolves every
//! namespace declaration (document root and nested) before any qualified
//! name is compared, and prefixed references (`tns:GetWeather`) are
//! matched by their local-name segment.

use super::resolve::{optionalize, sanitize_identifier, to_model_name, ModelRegistrar, MAX_REF_DEPTH, UNTYPED};
use super::types::{ModelFields, ModelMap, ParseOptions, SoapMeta, SoapStyle, ToolMeta};
use crate::error::SpecError;
use indexmap::IndexMap;
use roxmltree::{Document, Node};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";
const SOAP11_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
const SOAP12_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

fn local(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

fn is_wsdl(node: &Node, name: &str) -> bool {
    if !node.is_element() || node.tag_name().name() != name {
        return false;
    }
    let ns = node.tag_name().namespace();
    ns.is_none() || ns == Some(WSDL_NS)
}

// SOAP extension elements must carry the soap/soap12 namespace, otherwise
// an HTTP binding's identically-named extension would be misread.
fn is_soap_ext(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), Some(SOAP11_NS) | Some(SOAP12_NS))
}

fn is_xsd(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(XSD_NS)
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    element: Option<String>,
    type_ref: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct PortOp {
    input: Option<String>,
    output: Option<String>,
    doc: Option<String>,
}

struct XsdIndex<'a, 'i> {
    elements: HashMap<String, Node<'a, 'i>>,
    complex_types: HashMap<String, Node<'a, 'i>>,
}

fn build_xsd_index<'a, 'i>(root: Node<'a, 'i>) -> XsdIndex<'a, 'i> {
    let mut elements = HashMap::new();
    let mut complex_types = HashMap::new();
    for types in root.children().filter(|n| is_wsdl(n, "types")) {
        for schema in types.children().filter(|n| is_xsd(n, "schema")) {
            for child in schema.children().filter(Node::is_element) {
                let Some(name) = child.attribute("name") else {
                    continue;
                };
                if is_xsd(&child, "element") {
                    elements.insert(name.to_string(), child);
                } else if is_xsd(&child, "complexType") {
                    complex_types.insert(name.to_string(), child);
                }
            }
        }
    }
    XsdIndex {
        elements,
        complex_types,
    }
}

fn map_xsd_scalar(qname: &str) -> Option<&'static str> {
    match local(qname) {
        "string" | "anyURI" | "QName" | "NCName" | "token" | "normalizedString" | "date"
        | "dateTime" | "time" | "duration" | "base64Binary" | "hexBinary" | "ID" | "IDREF"
        | "language" => Some("str"),
        "int" | "integer" | "long" | "short" | "byte" | "unsignedLong" | "unsignedInt"
        | "unsignedShort" | "unsignedByte" | "nonNegativeInteger" | "positiveInteger"
        | "negativeInteger" | "nonPositiveInteger" => Some("int"),
        "float" | "double" | "decimal" => Some("float"),
        "boolean" => Some("bool"),
        _ => None,
    }
}

fn is_unbounded(el: &Node) -> bool {
    match el.attribute("maxOccurs") {
        Some("unbounded") => true,
        Some(n) => n.parse::<u32>().map(|v| v > 1).unwrap_or(false),
        None => false,
    }
}

fn is_optional_el(el: &Node) -> bool {
    el.attribute("minOccurs") == Some("0") || el.attribute("nillable") == Some("true")
}

fn register_complex_type<'a, 'i>(
    name: &str,
    ct: Node<'a, 'i>,
    index: &XsdIndex<'a, 'i>,
    registrar: &mut ModelRegistrar,
    visiting: &mut HashSet<String>,
    depth: usize,
) -> String {
    let model_name = to_model_name(name);
    if registrar.models().contains_key(&model_name) || visiting.contains(&model_name) {
        return model_name;
    }
    visiting.insert(model_name.clone());
    let fields = complex_type_fields(ct, index, registrar, visiting, depth + 1);
    visiting.remove(&model_name);
    if fields.is_empty() {
        return UNTYPED.to_string();
    }
    registrar.register(&model_name, fields)
}

fn complex_type_fields<'a, 'i>(
    ct: Node<'a, 'i>,
    index: &XsdIndex<'a, 'i>,
    registrar: &mut ModelRegistrar,
    visiting: &mut HashSet<String>,
    depth: usize,
) -> ModelFields {
    let mut fields = ModelFields::new();
    if depth > MAX_REF_DEPTH {
        return fields;
    }
    for group in ct
        .children()
        .filter(|n| is_xsd(n, "sequence") || is_xsd(n, "all") || is_xsd(n, "choice"))
    {
        for el in group.children().filter(|n| is_xsd(n, "element")) {
            let Some(name) = el.attribute("name").or_else(|| el.attribute("ref").map(local))
            else {
                continue;
            };
            let mut ty = element_type(el, index, registrar, visiting, depth + 1);
            if is_unbounded(&el) {
                ty = format!("list[{ty}]");
            }
            if is_optional_el(&el) {
                ty = optionalize(&ty);
            }
            fields.insert(sanitize_identifier(local(name)), ty);
        }
    }
    fields
}

fn element_type<'a, 'i>(
    el: Node<'a, 'i>,
    index: &XsdIndex<'a, 'i>,
    registrar: &mut ModelRegistrar,
    visiting: &mut HashSet<String>,
    depth: usize,
) -> String {
    if depth > MAX_REF_DEPTH {
        return UNTYPED.to_string();
    }
    if let Some(ty) = el.attribute("type") {
        if let Some(scalar) = map_xsd_scalar(ty) {
            return scalar.to_string();
        }
        let ct_name = local(ty);
        if let Some(ct) = index.complex_types.get(ct_name) {
            return register_complex_type(ct_name, *ct, index, registrar, visiting, depth);
        }
        return UNTYPED.to_string();
    }
    if let Some(ref_name) = el.attribute("ref") {
        let target_name = local(ref_name);
        if let Some(target) = index.elements.get(target_name) {
            return element_type(*target, index, registrar, visiting, depth + 1);
        }
        return UNTYPED.to_string();
    }
    if let Some(ct) = el.children().find(|n| is_xsd(n, "complexType")) {
        let name = el.attribute("name").unwrap_or("Inline");
        return register_complex_type(name, ct, index, registrar, visiting, depth);
    }
    // no type information at all: simple content
    "str".to_string()
}

/// Shape of a message part's referenced element.
enum ElementShape {
    /// A record schema, registered as a model.
    Record(String),
    /// Simple content mapped to a scalar type.
    Scalar(String),
}

fn element_shape<'a, 'i>(
    preferred: &str,
    el: Node<'a, 'i>,
    index: &XsdIndex<'a, 'i>,
    registrar: &mut ModelRegistrar,
) -> ElementShape {
    let mut visiting = HashSet::new();
    if let Some(ty) = el.attribute("type") {
        if let Some(scalar) = map_xsd_scalar(ty) {
            return ElementShape::Scalar(scalar.to_string());
        }
        if let Some(ct) = index.complex_types.get(local(ty)) {
            let fields = complex_type_fields(*ct, index, registrar, &mut visiting, 0);
            if fields.is_empty() {
                return ElementShape::Scalar(UNTYPED.to_string());
            }
            return ElementShape::Record(registrar.register(&to_model_name(preferred), fields));
        }
        return ElementShape::Scalar(UNTYPED.to_string());
    }
    if let Some(ct) = el.children().find(|n| is_xsd(n, "complexType")) {
        let fields = complex_type_fields(ct, index, registrar, &mut visiting, 0);
        if fields.is_empty() {
            return ElementShape::Scalar(UNTYPED.to_string());
        }
        return ElementShape::Record(registrar.register(&to_model_name(preferred), fields));
    }
    ElementShape::Scalar("str".to_string())
}

fn collect_messages(root: Node) -> HashMap<String, Vec<Part>> {
    let mut messages = HashMap::new();
    for msg in root.children().filter(|n| is_wsdl(n, "message")) {
        let Some(name) = msg.attribute("name") else {
            continue;
        };
        let parts = msg
            .children()
            .filter(|n| is_wsdl(n, "part"))
            .map(|p| Part {
                name: p.attribute("name").unwrap_or("").to_string(),
                element: p.attribute("element").map(str::to_string),
                type_ref: p.attribute("type").map(str::to_string),
            })
            .collect();
        messages.insert(name.to_string(), parts);
    }
    messages
}

fn collect_port_types(root: Node) -> HashMap<String, HashMap<String, PortOp>> {
    let mut port_types = HashMap::new();
    for pt in root.children().filter(|n| is_wsdl(n, "portType")) {
        let Some(name) = pt.attribute("name") else {
            continue;
        };
        let mut ops: HashMap<String, PortOp> = HashMap::new();
        for op in pt.children().filter(|n| is_wsdl(n, "operation")) {
            let Some(op_name) = op.attribute("name") else {
                continue;
            };
            let mut port_op = PortOp::default();
            for child in op.children().filter(Node::is_element) {
                if is_wsdl(&child, "input") {
                    port_op.input = child.attribute("message").map(|m| local(m).to_string());
                } else if is_wsdl(&child, "output") {
                    port_op.output = child.attribute("message").map(|m| local(m).to_string());
                } else if is_wsdl(&child, "documentation") {
                    port_op.doc = child.text().map(|t| t.trim().to_string());
                }
            }
            ops.insert(local(op_name).to_string(), port_op);
        }
        port_types.insert(name.to_string(), ops);
    }
    port_types
}

fn collect_addresses(root: Node) -> HashMap<String, String> {
    let mut addresses = HashMap::new();
    for service in root.children().filter(|n| is_wsdl(n, "service")) {
        for port in service.children().filter(|n| is_wsdl(n, "port")) {
            let Some(binding_ref) = port.attribute("binding") else {
                continue;
            };
            if let Some(location) = port
                .children()
                .find(|n| is_soap_ext(n, "address"))
                .and_then(|addr| addr.attribute("location"))
            {
                addresses.insert(local(binding_ref).to_string(), location.to_string());
            }
        }
    }
    addresses
}

/// Parse a WSDL 1.1 document into `(tools, models)`.
pub fn parse_soap(text: &str, opts: &ParseOptions) -> Result<(Vec<ToolMeta>, ModelMap), SpecError> {
    let _ = opts; // WSDL has no `$ref`s to degrade; kept for interface symmetry
    let doc = Document::parse(text)
        .map_err(|e| SpecError::Format(format!("input is not well-formed XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "definitions" {
        return Err(SpecError::missing(
            "definitions",
            format!(
                "expected a wsdl:definitions document root, found `{}`",
                root.tag_name().name()
            ),
        ));
    }
    let target_ns = root.attribute("targetNamespace").unwrap_or("").to_string();
    debug!(namespace = %target_ns, "parsing WSDL definitions");

    let xsd_index = build_xsd_index(root);
    let messages = collect_messages(root);
    let port_types = collect_port_types(root);
    let addresses = collect_addresses(root);

    let mut registrar = ModelRegistrar::new();
    let mut tools: Vec<ToolMeta> = Vec::new();
    let mut seen_ops: HashSet<String> = HashSet::new();
    let mut saw_soap_binding = false;

    for binding in root.children().filter(|n| is_wsdl(n, "binding")) {
        let binding_name = binding.attribute("name").unwrap_or("");
        let Some(soap_binding) = binding.children().find(|n| is_soap_ext(n, "binding")) else {
            // non-SOAP binding (e.g. HTTP); out of scope
            continue;
        };
        saw_soap_binding = true;
        let default_style = soap_binding.attribute("style").unwrap_or("document");

        let port_type_name = binding.attribute("type").map(local).ok_or_else(|| {
            SpecError::missing(
                "portType",
                format!("binding `{binding_name}` has no type attribute naming its portType"),
            )
        })?;
        let pt_ops = port_types.get(port_type_name).ok_or_else(|| {
            SpecError::missing(
                "portType",
                format!(
                    "binding `{binding_name}` references portType `{port_type_name}` which is not defined"
                ),
            )
        })?;

        let endpoint = addresses.get(binding_name).cloned().unwrap_or_default();
        if endpoint.is_empty() {
            warn!(binding = %binding_name, "no soap:address found for binding");
        }

        for op in binding.children().filter(|n| is_wsdl(n, "operation")) {
            let Some(op_name) = op.attribute("name") else {
                continue;
            };
            let op_local = local(op_name).to_string();
            // soap12 bindings commonly repeat the soap11 operations
            if !seen_ops.insert(op_local.clone()) {
                warn!(operation = %op_local, "skipping duplicate binding operation");
                continue;
            }
            let soap_op = op.children().find(|n| is_soap_ext(n, "operation"));
            let action = soap_op
                .and_then(|n| n.attribute("soapAction"))
                .unwrap_or("")
                .to_string();
            let style = match soap_op.and_then(|n| n.attribute("style")).unwrap_or(default_style) {
                "rpc" => SoapStyle::Rpc,
                _ => SoapStyle::Document,
            };

            let pt_op = pt_ops.get(&op_local).ok_or_else(|| {
                SpecError::missing(
                    "operation",
                    format!(
                        "binding operation `{op_local}` has no matching operation in portType `{port_type_name}`"
                    ),
                )
            })?;

            let tool_name = sanitize_identifier(&op_local);
            let mut args: IndexMap<String, String> = IndexMap::new();
            let mut body_model = None;

            if let Some(input_msg) = &pt_op.input {
                match messages.get(input_msg) {
                    Some(parts) => {
                        for part in parts {
                            if let Some(element_ref) = &part.element {
                                let el_local = local(element_ref);
                                match xsd_index.elements.get(el_local) {
                                    Some(el) => {
                                        // keep the model name distinct from the
                                        // generated function name
                                        let preferred = if to_model_name(el_local) == tool_name {
                                            format!("{el_local}Request")
                                        } else {
                                            el_local.to_string()
                                        };
                                        match element_shape(&preferred, *el, &xsd_index, &mut registrar)
                                        {
                                            ElementShape::Record(model) => {
                                                args.insert("body".to_string(), model.clone());
                                                body_model = Some(model);
                                            }
                                            ElementShape::Scalar(ty) => {
                                                args.insert(sanitize_identifier(el_local), ty);
                                            }
                                        }
                                    }
                                    None => {
                                        args.insert(
                                            sanitize_identifier(&part.name),
                                            UNTYPED.to_string(),
                                        );
                                    }
                                }
                            } else if let Some(type_ref) = &part.type_ref {
                                let ty = match map_xsd_scalar(type_ref) {
                                    Some(scalar) => scalar.to_string(),
                                    None => match xsd_index.complex_types.get(local(type_ref)) {
                                        Some(ct) => {
                                            let mut visiting = HashSet::new();
                                            register_complex_type(
                                                local(type_ref),
                                                *ct,
                                                &xsd_index,
                                                &mut registrar,
                                                &mut visiting,
                                                0,
                                            )
                                        }
                                        None => UNTYPED.to_string(),
                                    },
                                };
                                args.insert(sanitize_identifier(&part.name), ty);
                            } else {
                                args.insert(sanitize_identifier(&part.name), "str".to_string());
                            }
                        }
                    }
                    None => {
                        warn!(message = %input_msg, operation = %op_local, "input message not defined");
                    }
                }
            }

            let mut response_model = None;
            if let Some(output_msg) = &pt_op.output {
                if let Some(parts) = messages.get(output_msg) {
                    for part in parts {
                        if let Some(element_ref) = &part.element {
                            if let Some(el) = xsd_index.elements.get(local(element_ref)) {
                                let preferred = local(element_ref).to_string();
                                if let ElementShape::Record(model) =
                                    element_shape(&preferred, *el, &xsd_index, &mut registrar)
                                {
                                    response_model = Some(model);
                                    break;
                                }
                            }
                        }
                    }
                }
            }

            let description = pt_op
                .doc
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| format!("SOAP operation {op_local}"));

            tools.push(ToolMeta {
                name: tool_name,
                url: endpoint.clone(),
                method: op_local,
                auth: Default::default(),
                auth_env_var: None,
                args,
                body_model,
                response_model,
                has_file_fields: false,
                has_query_params: false,
                description,
                soap: Some(SoapMeta {
                    action,
                    style,
                    namespace: target_ns.clone(),
                }),
            });
        }
    }

    if !saw_soap_binding {
        return Err(SpecError::missing(
            "binding",
            "the WSDL defines no SOAP binding; expected a wsdl:binding element \
             carrying a soap:binding extension",
        ));
    }
    Ok((tools, registrar.into_models()))
}
