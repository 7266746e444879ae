//! Launch-time secret collection

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{JobError, Result};

/// Echo-free prompting capability
pub trait SecretPrompt: Send + Sync {
    /// Ask for a secret using exactly `label` as the prompt text
    fn prompt_secret(&self, label: &str) -> Result<String>;
}

/// Prompts on the controlling terminal with echo suppressed
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSecretPrompt;

impl SecretPrompt for TerminalSecretPrompt {
    fn prompt_secret(&self, label: &str) -> Result<String> {
        // dialoguer appends its own ": " separator
        let prompt = label.trim_end().trim_end_matches(':');
        let value = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?;
        Ok(value)
    }
}

pub fn prompt_label(field: &str) -> String {
    format!("Password for {}: ", field)
}

/// Solicit each required secret once, in order.
///
/// An empty answer aborts collection so a launch is never submitted with a
/// missing secret.
pub fn collect_secrets(
    prompt: &dyn SecretPrompt,
    fields: &[String],
) -> Result<BTreeMap<String, String>> {
    let mut secrets = BTreeMap::new();
    for field in fields {
        let value = prompt.prompt_secret(&prompt_label(field))?;
        if value.is_empty() {
            return Err(JobError::tool(format!(
                "A value for '{}' is required to start this job",
                field
            )));
        }
        debug!(field = %field, "Collected launch secret");
        secrets.insert(field.clone(), value);
    }
    Ok(secrets)
}
