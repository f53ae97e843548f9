//! REST server renderer.

use super::prompts::dedupe_prompt_names;
use super::registry::filter_models;
use super::templates::{
    model_contexts, py_str, render_template, PromptContext, ToolContext, REST_SERVER_TEMPLATE,
};
use crate::error::GenerateError;
use crate::spec::{ModelMap, PromptMeta, ToolMeta};
use minijinja::context;

/// Render a FastMCP server wrapping the given REST tools.
///
/// Pure and deterministic: identical inputs produce byte-identical text.
/// Prompt placeholder validation happens at the IR boundary
/// ([`crate::generator::validate_prompts`]); colliding prompt names are
/// auto-suffixed here so no variant is silently dropped.
pub fn render_rest_server(
    api_name: &str,
    tools: &[ToolMeta],
    prompts: &[PromptMeta],
    models: &ModelMap,
) -> Result<String, GenerateError> {
    let models = filter_models(tools, models)?;
    let prompts = dedupe_prompt_names(prompts);

    let tool_ctxs: Vec<ToolContext> = tools.iter().map(ToolContext::from_tool).collect();
    let prompt_ctxs: Vec<PromptContext> = prompts.iter().map(PromptContext::from_prompt).collect();
    let model_ctxs = model_contexts(&models);

    render_template(
        "rest_server",
        REST_SERVER_TEMPLATE,
        context! {
            api_name => api_name,
            api_name_lit => py_str(api_name),
            tools => tool_ctxs,
            prompts => prompt_ctxs,
            models => model_ctxs,
        },
    )
}
