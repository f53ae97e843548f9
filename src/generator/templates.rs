//! Render contexts and embedded server templates.
//!
//! The generated host language is Python (FastMCP). Context structs
//! precompute everything the templates need (quoting, auth kind, query
//! vs body placement) so the templates stay branch-light and the output
//! is deterministic: identical IR always renders byte-identical text.

use crate::error::GenerateError;
use crate::spec::{sanitize_identifier, AuthKind, ModelMap, PromptMeta, SoapStyle, ToolMeta};
use minijinja::Environment;
use serde::Serialize;
use std::collections::HashSet;

use super::prompts::prompt_arg_names;

/// Quote a string as a Python string literal. JSON string syntax is a
/// subset of Python's, escapes included.
pub(crate) fn py_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamContext {
    pub name: String,
    pub ty: String,
}

/// Per-tool template context.
#[derive(Debug, Clone, Serialize)]
pub struct ToolContext {
    pub name: String,
    pub url_lit: String,
    pub method: String,
    pub method_lower: String,
    pub description: String,
    /// "none" | "bearer" | "api_key"
    pub auth: &'static str,
    pub auth_env: String,
    pub params: Vec<ParamContext>,
    pub body_model: Option<String>,
    pub response_model: Option<String>,
    pub has_file_fields: bool,
    /// Emit the query-parameter block: GET always sends remaining args as
    /// query; other verbs only when no body model exists.
    pub send_query: bool,
    /// Non-GET verbs with a body model fold stray args into the payload.
    pub merge_into_body: bool,
    pub soap_action: String,
    pub soap_rpc: bool,
    pub soap_namespace: String,
}

impl ToolContext {
    pub fn from_tool(tool: &ToolMeta) -> Self {
        let path_params: HashSet<String> = tool.path_params().into_iter().collect();
        let has_loose_args = tool
            .args
            .keys()
            .any(|k| k.as_str() != "body" && !path_params.contains(k.as_str()));
        let is_get = tool.method == "GET";
        let (soap_action, soap_rpc, soap_namespace) = match &tool.soap {
            Some(soap) => (
                soap.action.clone(),
                soap.style == SoapStyle::Rpc,
                soap.namespace.clone(),
            ),
            None => (String::new(), false, String::new()),
        };
        ToolContext {
            name: tool.name.clone(),
            url_lit: py_str(&tool.url),
            method: tool.method.clone(),
            method_lower: tool.method.to_ascii_lowercase(),
            description: tool.description.replace("\"\"\"", "'''"),
            auth: match tool.auth {
                AuthKind::None => "none",
                AuthKind::BearerToken => "bearer",
                AuthKind::ApiKeyHeader => "api_key",
            },
            auth_env: tool.auth_env_var.clone().unwrap_or_default(),
            params: tool
                .args
                .iter()
                .map(|(name, ty)| ParamContext {
                    name: name.clone(),
                    ty: ty.clone(),
                })
                .collect(),
            body_model: tool.body_model.clone(),
            response_model: tool.response_model.clone(),
            has_file_fields: tool.has_file_fields,
            send_query: has_loose_args && (is_get || tool.body_model.is_none()),
            merge_into_body: has_loose_args && tool.body_model.is_some() && !is_get,
            soap_action,
            soap_rpc,
            soap_namespace,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldContext {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelContext {
    pub name: String,
    pub fields: Vec<FieldContext>,
}

pub fn model_contexts(models: &ModelMap) -> Vec<ModelContext> {
    models
        .iter()
        .map(|(name, fields)| ModelContext {
            name: name.clone(),
            fields: fields
                .iter()
                .map(|(field, ty)| FieldContext {
                    name: field.clone(),
                    ty: ty.clone(),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub name: String,
    pub name_lit: String,
    pub arg_list: Vec<String>,
    pub description: String,
    pub desc_lit: String,
    pub text_lit: String,
}

impl PromptContext {
    pub fn from_prompt(prompt: &PromptMeta) -> Self {
        let name = sanitize_identifier(&prompt.name);
        PromptContext {
            name_lit: py_str(&name),
            name,
            arg_list: prompt_arg_names(prompt),
            description: prompt.description.replace("\"\"\"", "'''"),
            desc_lit: py_str(&prompt.description),
            text_lit: py_str(&prompt.text),
        }
    }
}

/// Render a template with a fresh environment. Building the environment
/// per call keeps rendering a pure function of its inputs.
pub(crate) fn render_template(
    name: &'static str,
    source: &'static str,
    ctx: minijinja::Value,
) -> Result<String, GenerateError> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    let template = env.get_template(name)?;
    Ok(template.render(ctx)?)
}

/// FastMCP server wrapping REST operations.
pub(crate) const REST_SERVER_TEMPLATE: &str = r##"from mcp.server.fastmcp import FastMCP
import requests
import re
import os
from pydantic import BaseModel, ValidationError
from urllib3.util.retry import Retry
from requests.adapters import HTTPAdapter

# ------------------ Pydantic Models ------------------
{%- for model in models %}

class {{ model.name }}(BaseModel):
    """{{ model.name }} payload."""
{%- for field in model.fields %}
    {{ field.name }}: {{ field.ty }}
{%- endfor %}
{%- if not model.fields %}
    pass
{%- endif %}
{%- endfor %}


# --------- HTTP resilience & helper functions ---------
def _create_session_with_retries():
    session = requests.Session()
    retry_strategy = Retry(
        total=3,
        backoff_factor=0.5,
        status_forcelist=[429, 500, 502, 503, 504],
        allowed_methods=["GET", "POST", "PUT", "DELETE", "PATCH"],
    )
    adapter = HTTPAdapter(max_retries=retry_strategy)
    session.mount("http://", adapter)
    session.mount("https://", adapter)
    return session


def _extract_path_params(base_url, args):
    """Substitute {param} path placeholders and return the remaining args."""
    remaining = args.copy()
    path_params = re.findall(r"{(.*?)}", base_url)
    for param in path_params:
        if param in remaining:
            base_url = base_url.replace("{" + param + "}", str(remaining.pop(param)))
    return base_url, remaining


def _to_dict(obj):
    """Convert a Pydantic model or mapping to a plain dict."""
    if hasattr(obj, "model_dump") and callable(obj.model_dump):
        return obj.model_dump()
    if hasattr(obj, "dict") and callable(obj.dict):
        return obj.dict()
    return obj


_session = _create_session_with_retries()

# Initialize FastMCP server: {{ api_name }}
mcp = FastMCP({{ api_name_lit }})

{% for tool in tools %}
@mcp.tool()
def {{ tool.name }}({% for p in tool.params %}{{ p.name }}: {{ p.ty }}{% if not loop.last %}, {% endif %}{% endfor %}):
    """{{ tool.description }}"""
    args_dict = { {% for p in tool.params %}"{{ p.name }}": {{ p.name }}{% if not loop.last %}, {% endif %}{% endfor %} }
    base_url, remaining_args = _extract_path_params({{ tool.url_lit }}, args_dict)

    headers = {}
{%- if tool.auth == "bearer" %}
    headers["Authorization"] = f"Bearer {os.environ.get('{{ tool.auth_env }}', 'YOUR_TOKEN_HERE')}"
{%- elif tool.auth == "api_key" %}
    headers["X-API-KEY"] = os.environ.get('{{ tool.auth_env }}', 'YOUR_KEY_HERE')
{%- endif %}
{%- if tool.body_model %}
    payload = remaining_args.pop("body", None)
    payload_dict = _to_dict(payload) if payload is not None else {}
{%- endif %}
    try:
        request_kwargs = {"headers": headers, "timeout": 15}
{%- if tool.send_query %}
        if remaining_args:
            request_kwargs["params"] = remaining_args
{%- endif %}
{%- if tool.merge_into_body %}
        if remaining_args:
            payload_dict.update(remaining_args)
{%- endif %}
{%- if tool.body_model %}
        if payload_dict:
{%- if tool.has_file_fields %}
            request_kwargs["files"] = payload_dict
{%- else %}
            request_kwargs["json"] = payload_dict
{%- endif %}
{%- endif %}
        response = _session.{{ tool.method_lower }}(base_url, **request_kwargs)
        response.raise_for_status()

        if response.status_code == 204 or not response.text or response.text.strip() == "":
            return {"ok": True, "data": None, "message": "No content"}

        content_type = response.headers.get("Content-Type", "")
        if "application/json" not in content_type:
            return {
                "ok": False,
                "error": {
                    "type": "INVALID_CONTENT_TYPE",
                    "details": f"Expected JSON but got: {content_type}",
                    "response_text": response.text[:500],
                },
            }

        try:
            response_data = response.json()
        except ValueError as json_error:
            return {
                "ok": False,
                "error": {
                    "type": "JSON_PARSE_ERROR",
                    "details": str(json_error),
                    "response_text": response.text[:500],
                },
            }
{%- if tool.response_model %}

        if not isinstance(response_data, dict):
            return {
                "ok": False,
                "error": {
                    "type": "VALIDATION_ERROR",
                    "details": "Response data must be a JSON object",
                    "actual_type": type(response_data).__name__,
                },
            }
        try:
            validated_response = {{ tool.response_model }}(**response_data)
            return {"ok": True, "data": validated_response.model_dump()}
        except ValidationError as validation_error:
            return {
                "ok": False,
                "error": {
                    "type": "VALIDATION_ERROR",
                    "details": str(validation_error),
                    "response_data": response_data,
                },
            }
{%- else %}

        return {"ok": True, "data": response_data}
{%- endif %}
    except Exception as exc:
        if hasattr(exc, "response") and exc.response is not None:
            return {
                "ok": False,
                "error": {
                    "type": "HTTP_ERROR",
                    "details": {
                        "status_code": exc.response.status_code,
                        "body": exc.response.text[:500],
                    },
                },
            }
        return {
            "ok": False,
            "error": {"type": "EXCEPTION", "details": str(exc), "url_attempted": base_url},
        }

{% endfor %}
# --------- MCP Prompts ---------
{%- for prompt in prompts %}

@mcp.prompt()
def {{ prompt.name }}_prompt():
    """{{ prompt.description }}"""
    return {
        "name": {{ prompt.name_lit }},
        "arguments": [{% for a in prompt.arg_list %}"{{ a }}"{% if not loop.last %}, {% endif %}{% endfor %}],
        "description": {{ prompt.desc_lit }},
        "text": {{ prompt.text_lit }},
    }
{%- endfor %}

if __name__ == "__main__":
    mcp.run()
"##;

/// FastMCP server wrapping SOAP operations.
pub(crate) const SOAP_SERVER_TEMPLATE: &str = r##"from mcp.server.fastmcp import FastMCP
import requests
import os
import xml.etree.ElementTree as ET
from xml.sax.saxutils import escape
from pydantic import BaseModel
from urllib3.util.retry import Retry
from requests.adapters import HTTPAdapter

SOAP_ENVELOPE_NS = "http://schemas.xmlsoap.org/soap/envelope/"

# ------------------ Pydantic Models ------------------
{%- for model in models %}

class {{ model.name }}(BaseModel):
    """{{ model.name }} payload."""
{%- for field in model.fields %}
    {{ field.name }}: {{ field.ty }}
{%- endfor %}
{%- if not model.fields %}
    pass
{%- endif %}
{%- endfor %}


# --------- HTTP resilience & helper functions ---------
def _create_session_with_retries():
    session = requests.Session()
    retry_strategy = Retry(
        total=3,
        backoff_factor=0.5,
        status_forcelist=[429, 500, 502, 503, 504],
        allowed_methods=["GET", "POST", "PUT", "DELETE", "PATCH"],
    )
    adapter = HTTPAdapter(max_retries=retry_strategy)
    session.mount("http://", adapter)
    session.mount("https://", adapter)
    return session


def _to_dict(obj):
    """Convert a Pydantic model or mapping to a plain dict."""
    if hasattr(obj, "model_dump") and callable(obj.model_dump):
        return obj.model_dump()
    if hasattr(obj, "dict") and callable(obj.dict):
        return obj.dict()
    return obj


def _element_to_dict(element):
    """Collapse an XML element tree into plain dicts/lists/strings."""
    children = list(element)
    if not children:
        return element.text
    result = {}
    for child in children:
        tag = child.tag.split("}")[-1]
        value = _element_to_dict(child)
        if tag in result:
            existing = result[tag]
            if not isinstance(existing, list):
                result[tag] = [existing]
            result[tag].append(value)
        else:
            result[tag] = value
    return result


_session = _create_session_with_retries()

# Initialize FastMCP server: {{ api_name }}
mcp = FastMCP({{ api_name_lit }})

{% for tool in tools %}
@mcp.tool()
def {{ tool.name }}({% for p in tool.params %}{{ p.name }}: {{ p.ty }}{% if not loop.last %}, {% endif %}{% endfor %}):
    """{{ tool.description }}"""
    args_dict = { {% for p in tool.params %}"{{ p.name }}": {{ p.name }}{% if not loop.last %}, {% endif %}{% endfor %} }

    headers = {"Content-Type": "text/xml; charset=utf-8"}
    headers["SOAPAction"] = '"{{ tool.soap_action }}"'
{%- if tool.auth == "bearer" %}
    headers["Authorization"] = f"Bearer {os.environ.get('{{ tool.auth_env }}', 'YOUR_TOKEN_HERE')}"
{%- elif tool.auth == "api_key" %}
    headers["X-API-KEY"] = os.environ.get('{{ tool.auth_env }}', 'YOUR_KEY_HERE')
{%- endif %}
    payload = args_dict.pop("body", None)
    parts = dict(args_dict)
    if payload is not None:
        parts.update(_to_dict(payload))
    xml_parts = "".join(
        "<{0}>{1}</{0}>".format(key, escape(str(value)))
        for key, value in parts.items()
        if value is not None
    )
{%- if tool.soap_rpc %}
    operation = (
        '<ns:{{ tool.method }} xmlns:ns="{{ tool.soap_namespace }}">'
        + xml_parts
        + '</ns:{{ tool.method }}>'
    )
{%- else %}
    operation = (
        '<{{ tool.method }} xmlns="{{ tool.soap_namespace }}">'
        + xml_parts
        + '</{{ tool.method }}>'
    )
{%- endif %}
    envelope = (
        '<?xml version="1.0" encoding="utf-8"?>'
        '<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">'
        '<soap:Body>' + operation + '</soap:Body>'
        '</soap:Envelope>'
    )
    try:
        response = _session.post(
            {{ tool.url_lit }},
            data=envelope.encode("utf-8"),
            headers=headers,
            timeout=15,
        )
        response.raise_for_status()
        root = ET.fromstring(response.text)
        body = root.find("{" + SOAP_ENVELOPE_NS + "}Body")
        if body is None:
            return {
                "ok": False,
                "error": {
                    "type": "SOAP_FAULT",
                    "details": "response has no SOAP Body",
                    "response_text": response.text[:500],
                },
            }
        fault = body.find("{" + SOAP_ENVELOPE_NS + "}Fault")
        if fault is not None:
            return {"ok": False, "error": {"type": "SOAP_FAULT", "details": _element_to_dict(fault)}}
        return {"ok": True, "data": _element_to_dict(body)}
    except ET.ParseError as parse_error:
        return {
            "ok": False,
            "error": {
                "type": "XML_PARSE_ERROR",
                "details": str(parse_error),
                "response_text": response.text[:500],
            },
        }
    except Exception as exc:
        if hasattr(exc, "response") and exc.response is not None:
            return {
                "ok": False,
                "error": {
                    "type": "HTTP_ERROR",
                    "details": {
                        "status_code": exc.response.status_code,
                        "body": exc.response.text[:500],
                    },
                },
            }
        return {
            "ok": False,
            "error": {"type": "EXCEPTION", "details": str(exc), "url_attempted": {{ tool.url_lit }}},
        }

{% endfor %}
# --------- MCP Prompts ---------
{%- for prompt in prompts %}

@mcp.prompt()
def {{ prompt.name }}_prompt():
    """{{ prompt.description }}"""
    return {
        "name": {{ prompt.name_lit }},
        "arguments": [{% for a in prompt.arg_list %}"{{ a }}"{% if not loop.last %}, {% endif %}{% endfor %}],
        "description": {{ prompt.desc_lit }},
        "text": {{ prompt.text_lit }},
    }
{%- endfor %}

if __name__ == "__main__":
    mcp.run()
"##;
