//! Deployment artifact rendering.
//!
//! Consumes only the generation boundary data: the chosen API name, the
//! generated server file name, and the distinct set of credential
//! environment variables across all tools. Every renderer is a pure
//! string function.

use crate::spec::{api_slug, AuthKind, ToolMeta};
use serde_json::json;
use std::collections::BTreeSet;

/// Distinct credential environment variable names across all tools.
pub fn secret_env_vars(tools: &[ToolMeta]) -> BTreeSet<String> {
    tools
        .iter()
        .filter(|t| t.auth != AuthKind::None)
        .filter_map(|t| t.auth_env_var.clone())
        .collect()
}

/// File name for the generated server, e.g. `github_server.py`.
pub fn server_file_name(api_name: &str) -> String {
    format!("{}_server.py", api_slug(api_name))
}

/// Container build file installing the generated server's dependencies.
pub fn render_dockerfile(file_name: &str, secrets: &BTreeSet<String>) -> String {
    let mut env_lines = String::new();
    for (i, secret) in secrets.iter().enumerate() {
        env_lines.push_str(&format!("ENV {secret}=YOUR_TOKEN_{i}\n"));
    }
    if !env_lines.is_empty() {
        env_lines = format!("\n{env_lines}");
    }
    format!(
        "FROM python:3.11-slim\n\
         WORKDIR /app\n\
         \n\
         # Install dependencies\n\
         RUN pip install --no-cache-dir fastmcp requests pydantic urllib3\n\
         \n\
         # Copy server file\n\
         COPY {file_name} .\n\
         {env_lines}\n\
         CMD [\"python3\", \"{file_name}\"]\n"
    )
}

/// docker-compose service definition with env passthrough.
pub fn render_compose(api_name: &str, secrets: &BTreeSet<String>) -> String {
    let slug = api_slug(api_name);
    let mut out = format!(
        "version: '3.8'\n\
         services:\n\
         \x20 mcp:\n\
         \x20   build: .\n\
         \x20   container_name: {slug}_server\n\
         \x20   environment:"
    );
    if secrets.is_empty() {
        out.push_str("\n      {}");
    } else {
        for secret in secrets {
            out.push_str(&format!("\n      - {secret}=${{{secret}}}"));
        }
    }
    out.push_str("\n    restart: unless-stopped\n");
    out
}

/// Desktop MCP client configuration document.
pub fn render_desktop_config(api_name: &str, file_name: &str, secrets: &BTreeSet<String>) -> String {
    let env: serde_json::Map<String, serde_json::Value> = secrets
        .iter()
        .map(|s| (s.clone(), json!("YOUR_ACTUAL_TOKEN")))
        .collect();
    let config = json!({
        "mcpServers": {
            api_slug(api_name): {
                "command": "python3",
                "args": [file_name],
                "env": env,
            }
        }
    });
    // keys are sorted by serde_json's map, so output is stable
    serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string())
}

/// Shell snippet for local execution.
pub fn render_local_run(file_name: &str, secrets: &BTreeSet<String>) -> String {
    let mut out = String::from(
        "# Create virtual environment (recommended)\n\
         python3 -m venv venv\n\
         source venv/bin/activate\n\
         \n\
         # Install dependencies\n\
         pip install fastmcp requests pydantic urllib3\n",
    );
    if !secrets.is_empty() {
        out.push_str("\n# Set authentication\n");
        for secret in secrets {
            out.push_str(&format!("export {secret}='your-token-here'\n"));
        }
    }
    out.push_str(&format!("\n# Run the MCP server\npython3 {file_name}\n"));
    out
}
