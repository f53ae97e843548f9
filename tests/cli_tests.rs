#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::Parser;
use mcpforge::cli::{generate_to_dir, Cli, Commands};

const SWAGGER: &str = r#"{
    "swagger": "2.0",
    "host": "api.example.com",
    "schemes": ["https"],
    "basePath": "/v1",
    "securityDefinitions": {
        "api_key": {"type": "apiKey", "name": "X-API-Key", "in": "header"}
    },
    "paths": {
        "/items": {"get": {"operationId": "list_items"}}
    }
}"#;

#[test]
fn test_cli_parses_generate_command() {
    let cli = Cli::parse_from([
        "mcpforge-gen",
        "generate",
        "--spec",
        "petstore.yaml",
        "--name",
        "PetStore",
        "--deploy",
    ]);
    match cli.command {
        Commands::Generate {
            spec,
            name,
            out,
            deploy,
        } => {
            assert_eq!(spec.to_str(), Some("petstore.yaml"));
            assert_eq!(name, "PetStore");
            assert_eq!(out.to_str(), Some("."));
            assert!(deploy);
        }
        _ => panic!("expected generate command"),
    }
}

#[test]
fn test_generate_to_dir_writes_server_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let server_path = generate_to_dir(SWAGGER, "Demo API", dir.path(), true).unwrap();

    assert_eq!(server_path.file_name().unwrap(), "demo_api_server.py");
    let code = std::fs::read_to_string(&server_path).unwrap();
    assert!(code.contains("def list_items():"));
    assert!(code.contains("os.environ.get('X_API_KEY'"));

    let dockerfile = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("COPY demo_api_server.py ."));
    assert!(dockerfile.contains("ENV X_API_KEY="));

    let compose = std::fs::read_to_string(dir.path().join("docker-compose.yml")).unwrap();
    assert!(compose.contains("- X_API_KEY=${X_API_KEY}"));

    let desktop = std::fs::read_to_string(dir.path().join("desktop_config.json")).unwrap();
    assert!(desktop.contains("demo_api_server.py"));

    let run = std::fs::read_to_string(dir.path().join("run_local.sh")).unwrap();
    assert!(run.contains("export X_API_KEY="));
}

#[test]
fn test_generate_to_dir_without_deploy_writes_only_server() {
    let dir = tempfile::tempdir().unwrap();
    generate_to_dir(SWAGGER, "Demo", dir.path(), false).unwrap();
    assert!(dir.path().join("demo_server.py").exists());
    assert!(!dir.path().join("Dockerfile").exists());
}

#[test]
fn test_generate_to_dir_propagates_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate_to_dir(r#"{"swagger":"2.0","paths":{}}"#, "Demo", dir.path(), false)
        .unwrap_err();
    assert!(err.to_string().contains("host"));
}
