use crate::deploy::{
    render_compose, render_desktop_config, render_dockerfile, render_local_run, secret_env_vars,
    server_file_name,
};
use crate::generator::generate_server;
use crate::spec::{parse_spec, ParsedSpec};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line interface for the mcpforge generator.
#[derive(Parser)]
#[command(name = "mcpforge-gen")]
#[command(about = "Generate MCP servers from OpenAPI, Swagger, and WSDL specs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an MCP server from an API description
    Generate {
        /// Path to the specification file (OpenAPI/Swagger JSON or YAML, or WSDL XML)
        #[arg(short, long)]
        spec: PathBuf,

        /// Server name used for the generated file and deployment artifacts
        #[arg(short, long, default_value = "MyAPI")]
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Also write Dockerfile, docker-compose.yml, desktop config and run script
        #[arg(long, default_value_t = false)]
        deploy: bool,
    },
    /// Parse a spec and print the extracted tool table
    Inspect {
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Validate a spec and report typed errors
    Validate {
        #[arg(short, long)]
        spec: PathBuf,
    },
}

/// Parse a spec file, render the server (plus optional deployment
/// artifacts) into `out_dir`, and return the server file path.
pub fn generate_to_dir(
    spec_text: &str,
    api_name: &str,
    out_dir: &Path,
    deploy: bool,
) -> anyhow::Result<PathBuf> {
    let ParsedSpec { flavor, tools, models } = parse_spec(spec_text)?;
    info!(%flavor, tools = tools.len(), models = models.len(), "parsed specification");

    let code = generate_server(api_name, &tools, &[], &models)?;
    fs::create_dir_all(out_dir)?;
    let file_name = server_file_name(api_name);
    let server_path = out_dir.join(&file_name);
    fs::write(&server_path, &code)?;
    info!(path = %server_path.display(), "wrote server");

    if deploy {
        let secrets = secret_env_vars(&tools);
        fs::write(
            out_dir.join("Dockerfile"),
            render_dockerfile(&file_name, &secrets),
        )?;
        fs::write(
            out_dir.join("docker-compose.yml"),
            render_compose(api_name, &secrets),
        )?;
        fs::write(
            out_dir.join("desktop_config.json"),
            render_desktop_config(api_name, &file_name, &secrets),
        )?;
        fs::write(out_dir.join("run_local.sh"), render_local_run(&file_name, &secrets))?;
        info!(dir = %out_dir.display(), "wrote deployment artifacts");
    }
    Ok(server_path)
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate {
            spec,
            name,
            out,
            deploy,
        } => {
            let text = fs::read_to_string(spec)?;
            let path = generate_to_dir(&text, name, out, *deploy)?;
            println!("✅ Generated server: {}", path.display());
            Ok(())
        }
        Commands::Inspect { spec } => {
            let text = fs::read_to_string(spec)?;
            let parsed = parse_spec(&text)?;
            println!("flavor: {}", parsed.flavor);
            for tool in &parsed.tools {
                println!(
                    "{:6} {:40} {:24} auth={}",
                    tool.method, tool.url, tool.name, tool.auth
                );
            }
            println!(
                "{} tool(s), {} model(s)",
                parsed.tools.len(),
                parsed.models.len()
            );
            Ok(())
        }
        Commands::Validate { spec } => {
            let text = fs::read_to_string(spec)?;
            match parse_spec(&text) {
                Ok(parsed) => {
                    println!(
                        "✅ {}: {} tool(s), {} model(s)",
                        parsed.flavor,
                        parsed.tools.len(),
                        parsed.models.len()
                    );
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
    }
}
