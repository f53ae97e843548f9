//! Code generation: IR → runnable server source text.
//!
//! The pipeline is `filter_models` → context building → template render,
//! shared by both protocol renderers and routed through the dispatcher:
//!
//! ```text
//! (tools, models) ── registry ──▶ minimal models ── templates ──▶ source text
//!                                        ▲
//!                    prompts ── linker ──┘
//! ```
//!
//! Every function here is a pure transformation of its inputs; nothing
//! touches the filesystem or network.

mod dispatch;
mod prompts;
mod registry;
mod rest;
mod soap;
mod templates;

pub use dispatch::generate_server;
pub use prompts::{dedupe_prompt_names, link_prompts, prompt_arg_names, validate_prompts};
pub use registry::filter_models;
pub use rest::render_rest_server;
pub use soap::render_soap_server;
pub use templates::{
    model_contexts, FieldContext, ModelContext, ParamContext, PromptContext, ToolContext,
};
