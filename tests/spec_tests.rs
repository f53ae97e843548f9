#![allow(clippy::unwrap_used, clippy::expect_used)]

use mcpforge::spec::{parse_rest, parse_spec, AuthKind, ParseOptions, SpecFlavor};
use mcpforge::SpecError;

fn opts() -> ParseOptions {
    ParseOptions::default()
}

const PETSTORE_OPENAPI: &str = r#"
openapi: 3.0.0
info:
  title: Pet Store
  version: "1.0.0"
servers:
  - url: https://api.petstore.example.com/v2
components:
  securitySchemes:
    bearerAuth:
      type: http
      scheme: bearer
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
        tag: { type: string }
security:
  - bearerAuth: []
paths:
  /pets:
    get:
      operationId: list_pets
      summary: List all pets
      parameters:
        - name: limit
          in: query
          schema: { type: integer }
    post:
      operationId: create_pet
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
  /pets/{petId}:
    get:
      operationId: get_pet
      parameters:
        - name: petId
          in: path
          required: true
          schema: { type: string }
"#;

#[test]
fn test_openapi_parse_extracts_tools_and_models() {
    let parsed = parse_spec(PETSTORE_OPENAPI).unwrap();
    assert_eq!(parsed.flavor, SpecFlavor::OpenApi3);
    assert_eq!(parsed.tools.len(), 3);

    let list = parsed.tools.iter().find(|t| t.name == "list_pets").unwrap();
    assert_eq!(list.method, "GET");
    assert_eq!(list.url, "https://api.petstore.example.com/v2/pets");
    assert_eq!(list.args.get("limit").map(String::as_str), Some("int"));
    assert!(list.has_query_params);
    assert_eq!(list.description, "List all pets");
    assert!(!list.is_soap());

    let create = parsed.tools.iter().find(|t| t.name == "create_pet").unwrap();
    assert_eq!(create.body_model.as_deref(), Some("Pet"));
    assert_eq!(create.args.get("body").map(String::as_str), Some("Pet"));
    // body and response share one deduplicated model
    assert_eq!(create.response_model.as_deref(), Some("Pet"));

    let pet = &parsed.models["Pet"];
    assert_eq!(pet.get("name").map(String::as_str), Some("str"));
    assert_eq!(pet.get("tag").map(String::as_str), Some("str | None"));
}

#[test]
fn test_openapi_bearer_auth_from_global_security() {
    let parsed = parse_spec(PETSTORE_OPENAPI).unwrap();
    for tool in &parsed.tools {
        assert_eq!(tool.auth, AuthKind::BearerToken);
        assert_eq!(tool.auth_env_var.as_deref(), Some("BEARERAUTH_TOKEN"));
    }
}

#[test]
fn test_path_parameter_closure_holds_for_all_tools() {
    let parsed = parse_spec(PETSTORE_OPENAPI).unwrap();
    for tool in &parsed.tools {
        for param in tool.path_params() {
            assert!(
                tool.args.contains_key(&param),
                "tool {} missing path param {param}",
                tool.name
            );
        }
    }
}

#[test]
fn test_undeclared_path_placeholder_is_backfilled() {
    // {repo} appears in the template but is never declared as a parameter
    let spec = r#"{
        "swagger": "2.0",
        "host": "api.example.com",
        "schemes": ["https"],
        "basePath": "/v1",
        "paths": {
            "/repos/{owner}/{repo}": {
                "get": {
                    "operationId": "get_repo",
                    "parameters": [
                        {"name": "owner", "in": "path", "required": true, "type": "string"}
                    ]
                }
            }
        }
    }"#;
    let (tools, _) = parse_rest(spec, &opts()).unwrap();
    let tool = &tools[0];
    assert_eq!(tool.args.get("owner").map(String::as_str), Some("str"));
    assert_eq!(tool.args.get("repo").map(String::as_str), Some("str"));
    let keys: Vec<&String> = tool.args.keys().collect();
    assert_eq!(keys, vec!["owner", "repo"]);
}

#[test]
fn test_swagger_missing_host_fails_then_succeeds_when_added() {
    // the minimal failing document
    let bad = r#"{"swagger":"2.0","paths":{"/x":{"get":{}}}}"#;
    let err = parse_rest(bad, &opts()).unwrap_err();
    assert!(matches!(err, SpecError::Validation { .. }));
    assert!(err.to_string().contains("host"));

    // adding host/schemes/basePath fixes it and composes the URL
    let good = r#"{
        "swagger": "2.0",
        "host": "api.example.com",
        "schemes": ["https"],
        "basePath": "/v1",
        "paths": {"/x": {"get": {}}}
    }"#;
    let (tools, _) = parse_rest(good, &opts()).unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].url, "https://api.example.com/v1/x");
    assert_eq!(tools[0].name, "get_x");
}

#[test]
fn test_swagger_missing_schemes_and_base_path_fail() {
    let no_schemes = r#"{"swagger":"2.0","host":"a.example.com","basePath":"/","paths":{}}"#;
    let err = parse_rest(no_schemes, &opts()).unwrap_err();
    assert!(err.to_string().contains("schemes"));

    let no_base = r#"{"swagger":"2.0","host":"a.example.com","schemes":["https"],"paths":{}}"#;
    let err = parse_rest(no_base, &opts()).unwrap_err();
    assert!(err.to_string().contains("basePath"));
}

#[test]
fn test_openapi_empty_servers_fails_naming_servers() {
    let spec = r#"{"openapi":"3.0.0","servers":[],"paths":{}}"#;
    let err = parse_rest(spec, &opts()).unwrap_err();
    assert!(matches!(err, SpecError::Validation { .. }));
    assert!(err.to_string().contains("servers"));

    let no_servers = r#"{"openapi":"3.0.0","paths":{}}"#;
    let err = parse_rest(no_servers, &opts()).unwrap_err();
    assert!(err.to_string().contains("servers"));
}

#[test]
fn test_invalid_text_is_a_format_error() {
    let err = parse_rest("{]not json or yaml", &opts()).unwrap_err();
    assert!(matches!(err, SpecError::Format(_)));
}

#[test]
fn test_swagger_api_key_and_formdata_file() {
    let spec = r#"{
        "swagger": "2.0",
        "host": "upload.example.com",
        "schemes": ["https"],
        "basePath": "/",
        "securityDefinitions": {
            "api_key": {"type": "apiKey", "name": "X-API-Key", "in": "header"}
        },
        "paths": {
            "/upload": {
                "post": {
                    "operationId": "upload_image",
                    "parameters": [
                        {"name": "file", "in": "formData", "type": "file"},
                        {"name": "caption", "in": "formData", "type": "string"}
                    ]
                }
            }
        }
    }"#;
    let (tools, models) = parse_rest(spec, &opts()).unwrap();
    let tool = &tools[0];
    assert_eq!(tool.auth, AuthKind::ApiKeyHeader);
    assert_eq!(tool.auth_env_var.as_deref(), Some("X_API_KEY"));
    assert!(tool.has_file_fields);
    let model = tool.body_model.as_ref().unwrap();
    let fields = &models[model];
    assert_eq!(fields.get("file").map(String::as_str), Some("str"));
    assert_eq!(fields.get("caption").map(String::as_str), Some("str"));
}

#[test]
fn test_swagger_body_param_builds_model() {
    let spec = r#"{
        "swagger": "2.0",
        "host": "api.example.com",
        "schemes": ["https"],
        "basePath": "/v1",
        "paths": {
            "/users": {
                "post": {
                    "operationId": "create_user",
                    "parameters": [
                        {
                            "name": "body",
                            "in": "body",
                            "schema": {
                                "type": "object",
                                "required": ["name"],
                                "properties": {
                                    "name": {"type": "string"},
                                    "age": {"type": "integer"}
                                }
                            }
                        }
                    ]
                }
            }
        }
    }"#;
    let (tools, models) = parse_rest(spec, &opts()).unwrap();
    let tool = &tools[0];
    assert_eq!(tool.body_model.as_deref(), Some("User"));
    assert_eq!(
        models["User"].get("age").map(String::as_str),
        Some("int | None")
    );
}

#[test]
fn test_propertyless_body_gets_placeholder_model() {
    let spec = r#"{
        "openapi": "3.0.0",
        "servers": [{"url": "https://api.example.com"}],
        "paths": {
            "/ping": {
                "post": {
                    "operationId": "send_ping",
                    "requestBody": {
                        "content": {"application/json": {"schema": {}}}
                    }
                }
            }
        }
    }"#;
    let (tools, models) = parse_rest(spec, &opts()).unwrap();
    let tool = &tools[0];
    let model = tool.body_model.as_deref().unwrap();
    assert_eq!(model, "SendPingRequest");
    assert_eq!(models[model].get("data").map(String::as_str), Some("dict"));
}

#[test]
fn test_operation_without_id_synthesizes_name() {
    let spec = r#"{
        "openapi": "3.0.0",
        "servers": [{"url": "https://api.example.com"}],
        "paths": {
            "/users/{id}/posts": {"get": {}}
        }
    }"#;
    let (tools, _) = parse_rest(spec, &opts()).unwrap();
    assert_eq!(tools[0].name, "get_users_id_posts");
}

#[test]
fn test_shared_body_shapes_are_deduplicated() {
    let spec = r##"{
        "openapi": "3.0.0",
        "servers": [{"url": "https://api.example.com"}],
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            }
        },
        "paths": {
            "/users": {
                "post": {
                    "operationId": "create_user",
                    "requestBody": {
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
                    }
                }
            },
            "/accounts": {
                "post": {
                    "operationId": "create_account",
                    "requestBody": {
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
                    }
                }
            }
        }
    }"##;
    let (tools, models) = parse_rest(spec, &opts()).unwrap();
    assert_eq!(models.len(), 1);
    let names: Vec<&str> = tools
        .iter()
        .filter_map(|t| t.body_model.as_deref())
        .collect();
    assert_eq!(names, vec!["Account", "Account"]);
}
