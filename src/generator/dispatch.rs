//! Generation dispatcher: the single point where the REST/SOAP split is
//! decided.

use super::rest::render_rest_server;
use super::soap::render_soap_server;
use crate::error::GenerateError;
use crate::spec::{ModelMap, PromptMeta, ToolMeta};

/// Route a tool set to the matching renderer.
///
/// All tools SOAP → SOAP renderer; none SOAP → REST renderer; a mixed set
/// is rejected with a typed error rather than silently dropping a subset.
/// An empty tool set renders to an empty string.
pub fn generate_server(
    api_name: &str,
    tools: &[ToolMeta],
    prompts: &[PromptMeta],
    models: &ModelMap,
) -> Result<String, GenerateError> {
    if tools.is_empty() {
        return Ok(String::new());
    }
    let soap = tools.iter().filter(|t| t.is_soap()).count();
    if soap == tools.len() {
        render_soap_server(api_name, tools, prompts, models)
    } else if soap == 0 {
        render_rest_server(api_name, tools, prompts, models)
    } else {
        Err(GenerateError::MixedToolKinds {
            rest: tools.len() - soap,
            soap,
        })
    }
}
