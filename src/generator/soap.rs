//! SOAP server renderer.

use super::prompts::dedupe_prompt_names;
use super::registry::filter_models;
use super::templates::{
    model_contexts, py_str, render_template, PromptContext, ToolContext, SOAP_SERVER_TEMPLATE,
};
use crate::error::GenerateError;
use crate::spec::{ModelMap, PromptMeta, ToolMeta};
use minijinja::context;

/// Render a FastMCP server wrapping the given SOAP tools.
///
/// Pure and deterministic: identical inputs produce byte-identical text.
/// Auth header emission and the retry-configured session follow the same
/// rules as the REST renderer.
pub fn render_soap_server(
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
        "soap_server",
        SOAP_SERVER_TEMPLATE,
        context! {
            api_name => api_name,
            api_name_lit => py_str(api_name),
            tools => tool_ctxs,
            prompts => prompt_ctxs,
            models => model_ctxs,
        },
    )
}
