//! # mcpforge
//!
//! **mcpforge** converts machine-readable API descriptions — OpenAPI 3.0,
//! Swagger 2.0, and WSDL 1.1 — into generated source code for a runnable
//! MCP server wrapper, plus the data deployment artifacts need.
//!
//! ## Overview
//!
//! The crate is a single synchronous transformation pipeline:
//!
//! ```text
//! raw spec text
//!     │
//!     ▼
//! spec::parse_spec ── flavor detected once (OpenAPI 3 | Swagger 2 | WSDL 1.1)
//!     │
//!     ▼
//! (tools, models)  ── the IR: every downstream consumer depends only on this
//!     │
//!     ▼
//! generator::generate_server ── registry filters models, dispatcher picks
//!     │                         the REST or SOAP renderer
//!     ▼
//! server source text (+ deploy::* artifact renderers)
//! ```
//!
//! Both REST dialects and WSDL are parsed into the *same* IR shapes so one
//! generator layer serves both protocol families. Schema `$ref`s are
//! resolved recursively with a depth cap; unresolved references degrade to
//! best-effort fallback types instead of failing the parse.
//!
//! ## Modules
//!
//! - **[`spec`]** — parsing: reference resolver, type mapper, REST and
//!   SOAP parsers, flavor detection
//! - **[`generator`]** — model registry, prompt linking, template
//!   rendering, REST/SOAP dispatch
//! - **[`deploy`]** — deployment artifact rendering (Dockerfile, compose,
//!   desktop config) from the IR boundary data
//! - **[`error`]** — typed error kinds: format vs validation vs generation
//! - **[`cli`]** — the `mcpforge-gen` binary's commands
//!
//! ## Quick start
//!
//! ```no_run
//! use mcpforge::{generate_server, parse_spec};
//!
//! # fn main() -> anyhow::Result<()> {
//! let text = std::fs::read_to_string("petstore.yaml")?;
//! let parsed = parse_spec(&text)?;
//! let code = generate_server("PetStore", &parsed.tools, &[], &parsed.models)?;
//! println!("{code}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism** — rendering is a pure function; identical IR yields
//!   byte-identical output.
//! - **Path-parameter closure** — every `{name}` in a tool's URL template
//!   is a key of its `args`, enforced during parsing.
//! - **Model reachability** — generated code never references a model
//!   missing from the filtered model map; the registry fails fast instead.
//! - **Comprehensible failures** — validation errors name the missing
//!   anchor (`servers`, `host`, `binding`, …) and show the expected shape.
//!
//! The core performs no network I/O and owns no shared mutable state, so
//! concurrent invocations are safe without locking.

pub mod cli;
pub mod deploy;
pub mod error;
pub mod generator;
pub mod spec;

pub use error::{GenerateError, PromptError, SpecError};
pub use generator::{filter_models, generate_server, render_rest_server, render_soap_server};
pub use spec::{
    parse_spec, parse_spec_with, AuthKind, ModelFields, ModelMap, ParseOptions, ParsedSpec,
    PromptMeta, SoapMeta, SoapStyle, SpecFlavor, ToolMeta, UnresolvedRefStyle,
};
