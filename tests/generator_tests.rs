#![allow(clippy::unwrap_used, clippy::expect_used)]

use indexmap::IndexMap;
use mcpforge::spec::{parse_spec, AuthKind, ModelFields, ModelMap, PromptMeta, ToolMeta};
use mcpforge::{generate_server, render_rest_server, GenerateError};

fn tool(name: &str, method: &str, url: &str) -> ToolMeta {
    ToolMeta {
        name: name.to_string(),
        url: url.to_string(),
        method: method.to_string(),
        auth: AuthKind::None,
        auth_env_var: None,
        args: IndexMap::new(),
        body_model: None,
        response_model: None,
        has_file_fields: false,
        has_query_params: false,
        description: format!("{method} {url}"),
        soap: None,
    }
}

fn fields(pairs: &[(&str, &str)]) -> ModelFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const SPEC: &str = r##"{
    "openapi": "3.0.0",
    "servers": [{"url": "https://api.example.com/v1"}],
    "components": {
        "securitySchemes": {
            "bearerAuth": {"type": "http", "scheme": "bearer"}
        },
        "schemas": {
            "Item": {
                "type": "object",
                "required": ["name"],
                "properties": {"name": {"type": "string"}, "count": {"type": "integer"}}
            }
        }
    },
    "security": [{"bearerAuth": []}],
    "paths": {
        "/items": {
            "get": {
                "operationId": "list_items",
                "parameters": [{"name": "limit", "in": "query", "schema": {"type": "integer"}}]
            },
            "post": {
                "operationId": "create_item",
                "requestBody": {
                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Item"}}}
                }
            }
        }
    }
}"##;

#[test]
fn test_render_is_deterministic_end_to_end() {
    let first_parse = parse_spec(SPEC).unwrap();
    let second_parse = parse_spec(SPEC).unwrap();
    let first = generate_server("Demo", &first_parse.tools, &[], &first_parse.models).unwrap();
    let second = generate_server("Demo", &second_parse.tools, &[], &second_parse.models).unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_rendered_server_has_session_and_retries() {
    let parsed = parse_spec(SPEC).unwrap();
    let code = generate_server("Demo", &parsed.tools, &[], &parsed.models).unwrap();
    assert!(code.starts_with("from mcp.server.fastmcp import FastMCP"));
    assert!(code.contains("mcp = FastMCP(\"Demo\")"));
    // one shared retry-configured session, not one per call
    assert_eq!(code.matches("_session = _create_session_with_retries()").count(), 1);
    assert!(code.contains("total=3"));
    assert!(code.contains("status_forcelist=[429, 500, 502, 503, 504]"));
    assert!(code.contains("allowed_methods=[\"GET\", \"POST\", \"PUT\", \"DELETE\", \"PATCH\"]"));
}

#[test]
fn test_bearer_auth_header_references_env_var() {
    let parsed = parse_spec(SPEC).unwrap();
    let code = generate_server("Demo", &parsed.tools, &[], &parsed.models).unwrap();
    assert!(code.contains("headers[\"Authorization\"] = f\"Bearer {os.environ.get('BEARERAUTH_TOKEN', 'YOUR_TOKEN_HERE')}\""));
}

#[test]
fn test_api_key_header_and_no_auth_render() {
    let mut keyed = tool("get_data", "GET", "https://api.example.com/data");
    keyed.auth = AuthKind::ApiKeyHeader;
    keyed.auth_env_var = Some("API_KEY".to_string());
    let code = render_rest_server("Demo", &[keyed], &[], &ModelMap::new()).unwrap();
    assert!(code.contains("headers[\"X-API-KEY\"] = os.environ.get('API_KEY', 'YOUR_KEY_HERE')"));

    let plain = tool("get_open", "GET", "https://api.example.com/open");
    let code = render_rest_server("Demo", &[plain], &[], &ModelMap::new()).unwrap();
    assert!(!code.contains("X-API-KEY"));
    assert!(!code.contains("Authorization"));
}

#[test]
fn test_get_sends_query_post_sends_body() {
    let mut getter = tool("search", "GET", "https://api.example.com/search");
    getter.args.insert("q".to_string(), "str".to_string());
    getter.has_query_params = true;

    let mut poster = tool("create_user", "POST", "https://api.example.com/users");
    poster.args.insert("body".to_string(), "User".to_string());
    poster.body_model = Some("User".to_string());

    let mut models = ModelMap::new();
    models.insert("User".to_string(), fields(&[("name", "str")]));

    let code = generate_server("Demo", &[getter, poster], &[], &models).unwrap();
    assert!(code.contains("request_kwargs[\"params\"] = remaining_args"));
    assert!(code.contains("request_kwargs[\"json\"] = payload_dict"));
    assert!(code.contains("class User(BaseModel):"));
}

#[test]
fn test_file_fields_use_multipart() {
    let mut uploader = tool("upload_image", "POST", "https://api.example.com/upload");
    uploader.args.insert("body".to_string(), "Image".to_string());
    uploader.body_model = Some("Image".to_string());
    uploader.has_file_fields = true;
    let mut models = ModelMap::new();
    models.insert("Image".to_string(), fields(&[("file", "str")]));

    let code = generate_server("Demo", &[uploader], &[], &models).unwrap();
    assert!(code.contains("request_kwargs[\"files\"] = payload_dict"));
    assert!(!code.contains("request_kwargs[\"json\"]"));
}

#[test]
fn test_unused_models_never_reach_the_output() {
    let mut poster = tool("create_user", "POST", "https://api.example.com/users");
    poster.args.insert("body".to_string(), "User".to_string());
    poster.body_model = Some("User".to_string());

    let mut models = ModelMap::new();
    models.insert("User".to_string(), fields(&[("name", "str")]));
    models.insert("Orphan".to_string(), fields(&[("x", "str")]));

    let code = generate_server("Demo", &[poster], &[], &models).unwrap();
    assert!(code.contains("class User(BaseModel):"));
    assert!(!code.contains("class Orphan"));
}

#[test]
fn test_missing_body_model_is_an_internal_error() {
    let mut broken = tool("create_user", "POST", "https://api.example.com/users");
    broken.body_model = Some("Ghost".to_string());
    let err = generate_server("Demo", &[broken], &[], &ModelMap::new()).unwrap_err();
    assert!(matches!(err, GenerateError::MissingModel { .. }));
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn test_empty_tool_set_renders_nothing() {
    let code = generate_server("Demo", &[], &[], &ModelMap::new()).unwrap();
    assert!(code.is_empty());
}

#[test]
fn test_prompt_collisions_are_observably_suffixed() {
    let getter = tool("get_user", "GET", "https://api.example.com/users/{id}");
    let prompts = vec![
        PromptMeta {
            name: "get_user".to_string(),
            args: "id".to_string(),
            text: "Fetch user {id}".to_string(),
            description: "Fetch a user".to_string(),
        },
        PromptMeta {
            name: "get_user".to_string(),
            args: "id".to_string(),
            text: "Look up the account for {id}".to_string(),
            description: "Variant".to_string(),
        },
    ];
    let code = render_rest_server("Demo", &[getter], &prompts, &ModelMap::new()).unwrap();
    assert!(code.contains("def get_user_prompt():"));
    assert!(code.contains("def get_user_2_prompt():"));
    assert!(code.contains("\"Fetch user {id}\""));
    assert!(code.contains("\"Look up the account for {id}\""));
}

#[test]
fn test_nested_models_render_before_their_parents() {
    let spec = r#"{
        "openapi": "3.0.0",
        "servers": [{"url": "https://api.example.com"}],
        "paths": {
            "/users": {
                "post": {
                    "operationId": "create_user",
                    "requestBody": {
                        "content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["name", "address"],
                            "properties": {
                                "name": {"type": "string"},
                                "address": {
                                    "type": "object",
                                    "required": ["street"],
                                    "properties": {"street": {"type": "string"}}
                                }
                            }
                        }}}
                    }
                }
            }
        }
    }"#;
    let parsed = parse_spec(spec).unwrap();
    let code = generate_server("Demo", &parsed.tools, &[], &parsed.models).unwrap();
    let address_pos = code.find("class Address(BaseModel):").unwrap();
    let user_pos = code.find("class User(BaseModel):").unwrap();
    assert!(address_pos < user_pos, "referenced model must be defined first");
}
