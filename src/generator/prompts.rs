//! Prompt linking and validation.
//!
//! Prompt text is produced by an external generator; this layer only
//! checks the invariants the IR depends on: every `{placeholder}` in a
//! prompt's text must name one of its declared arguments, and a prompt
//! auto-links to the tool whose name it carries. Name collisions are
//! resolved by deterministic auto-suffixing so no variant is silently
//! lost.

use crate::error::PromptError;
use crate::spec::{PromptMeta, ToolMeta};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern"));

/// Split a prompt's comma-joined argument string into names.
pub fn prompt_arg_names(prompt: &PromptMeta) -> Vec<String> {
    prompt
        .args
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check that every `{placeholder}` in each prompt's text names a declared
/// argument.
pub fn validate_prompts(prompts: &[PromptMeta]) -> Result<(), PromptError> {
    for prompt in prompts {
        let declared: HashSet<String> = prompt_arg_names(prompt).into_iter().collect();
        for captures in PLACEHOLDER_RE.captures_iter(&prompt.text) {
            let placeholder = &captures[1];
            if !declared.contains(placeholder) {
                return Err(PromptError::UnknownPlaceholder {
                    prompt: prompt.name.clone(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Associate each prompt with the tool sharing its name, if any.
pub fn link_prompts<'a>(
    tools: &'a [ToolMeta],
    prompts: &'a [PromptMeta],
) -> Vec<(&'a PromptMeta, Option<&'a ToolMeta>)> {
    prompts
        .iter()
        .map(|p| (p, tools.iter().find(|t| t.name == p.name)))
        .collect()
}

/// Resolve prompt name collisions by suffixing later entries: `name`,
/// `name_2`, `name_3`, in input order. The rendered output keeps every
/// variant distinguishable.
pub fn dedupe_prompt_names(prompts: &[PromptMeta]) -> Vec<PromptMeta> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = prompts.iter().map(|p| p.name.clone()).collect();
    let mut out = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        let seen = counts.entry(prompt.name.clone()).or_insert(0);
        *seen += 1;
        let mut renamed = prompt.clone();
        if *seen > 1 {
            let mut suffix = *seen;
            loop {
                let candidate = format!("{}_{}", prompt.name, suffix);
                if !taken.contains(&candidate) {
                    taken.insert(candidate.clone());
                    renamed.name = candidate;
                    break;
                }
                suffix += 1;
            }
        }
        out.push(renamed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(name: &str, args: &str, text: &str) -> PromptMeta {
        PromptMeta {
            name: name.to_string(),
            args: args.to_string(),
            text: text.to_string(),
            description: "Prompt".to_string(),
        }
    }

    #[test]
    fn test_placeholders_must_be_declared() {
        let good = prompt("get_user", "id, limit", "Fetch user {id} with {limit} rows");
        assert!(validate_prompts(&[good]).is_ok());

        let bad = prompt("get_user", "id", "Fetch user {user_id}");
        let err = validate_prompts(&[bad]).unwrap_err();
        assert!(err.to_string().contains("user_id"));
    }

    #[test]
    fn test_collisions_are_suffixed_deterministically() {
        let prompts = vec![
            prompt("summarize", "id", "Summarize {id}"),
            prompt("summarize", "id", "Summarize {id} differently"),
            prompt("summarize", "id", "A third variant for {id}"),
        ];
        let deduped = dedupe_prompt_names(&prompts);
        let names: Vec<&str> = deduped.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["summarize", "summarize_2", "summarize_3"]);
    }
}
