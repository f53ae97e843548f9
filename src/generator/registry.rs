//! Model registry: computes the minimal closure of models a tool set
//! actually references, so the renderers never see an unused definition.

use crate::error::GenerateError;
use crate::spec::{base_type_name, ModelMap, ToolMeta};
use std::collections::HashSet;

/// Filter `models` down to the set transitively reachable from every
/// tool's `body_model`/`response_model`, following model names embedded in
/// field type strings. Source insertion order is preserved.
///
/// A tool referencing a model absent from `models` is an
/// internal-consistency violation and fails fast rather than letting the
/// renderer emit a reference to an undefined type.
pub fn filter_models(tools: &[ToolMeta], models: &ModelMap) -> Result<ModelMap, GenerateError> {
    let mut stack: Vec<String> = Vec::new();
    for tool in tools {
        for root in tool.body_model.iter().chain(tool.response_model.iter()) {
            if !models.contains_key(root) {
                return Err(GenerateError::MissingModel {
                    tool: tool.name.clone(),
                    model: root.clone(),
                });
            }
            stack.push(root.clone());
        }
    }

    let mut reachable: HashSet<String> = HashSet::new();
    while let Some(name) = stack.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(fields) = models.get(&name) {
            for ty in fields.values() {
                let base = base_type_name(ty);
                if models.contains_key(base) {
                    stack.push(base.to_string());
                }
            }
        }
    }

    Ok(models
        .iter()
        .filter(|(name, _)| reachable.contains(name.as_str()))
        .map(|(name, fields)| (name.clone(), fields.clone()))
        .collect())
}
