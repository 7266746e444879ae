//! Extra-variable resolution for launches

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{JobError, Result};
use crate::jobs::models::JobTemplate;

/// Comment block placed above the template defaults in the editor buffer
pub const EDITOR_HINT: &str =
    "# Specify extra variables (if any) here.\n# Lines beginning with \"#\" are ignored.\n";

/// Interactive text editing capability
pub trait Editor: Send + Sync {
    /// Let the user edit `initial` and return the resulting text.
    /// A dismissed session yields an empty string.
    fn edit(&self, initial: &str) -> Result<String>;
}

/// Editor that opens `$VISUAL` / `$EDITOR` on a temporary file
#[derive(Debug, Clone)]
pub struct TerminalEditor {
    extension: String,
}

impl Default for TerminalEditor {
    fn default() -> Self {
        Self {
            extension: ".yml".to_string(),
        }
    }
}

impl Editor for TerminalEditor {
    fn edit(&self, initial: &str) -> Result<String> {
        let edited = dialoguer::Editor::new()
            .extension(&self.extension)
            .require_save(true)
            .edit(initial)?;
        Ok(edited.unwrap_or_default())
    }
}

/// Call-time extra variables: inline text or a readable source
pub enum ExtraVarsInput {
    Inline(String),
    Reader(Box<dyn Read + Send>),
}

impl std::fmt::Debug for ExtraVarsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtraVarsInput::Inline(text) => f.debug_tuple("Inline").field(text).finish(),
            ExtraVarsInput::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl ExtraVarsInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            JobError::tool(format!(
                "cannot read extra variables from {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(ExtraVarsInput::Reader(Box::new(file)))
    }

    /// Interpret a command-line value: `@-` reads stdin, `@path` reads a file,
    /// anything else is inline text.
    pub fn from_cli_value(value: &str) -> Result<Self> {
        match value.strip_prefix('@') {
            Some("-") => Ok(ExtraVarsInput::Reader(Box::new(std::io::stdin()))),
            Some(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(ExtraVarsInput::Inline(value.to_string())),
        }
    }

    /// Consume the input, reading a file-like source to its end
    pub fn into_text(self) -> Result<String> {
        match self {
            ExtraVarsInput::Inline(text) => Ok(text),
            ExtraVarsInput::Reader(mut reader) => {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }
}

/// Drop comment lines at the top of an edited buffer, keeping the rest verbatim
pub fn strip_leading_comments(text: &str) -> &str {
    let mut rest = text;
    while rest.starts_with('#') {
        rest = match rest.find('\n') {
            Some(end) => &rest[end + 1..],
            None => "",
        };
    }
    rest
}

/// Decide the extra variables submitted with a launch.
///
/// Call-time input wins verbatim. Without it, a template that asks for
/// variables on launch opens the editor unless `no_input` is set. Otherwise the
/// template default is used, or nothing when the template has none.
pub fn resolve_extra_vars(
    template: &JobTemplate,
    input: Option<ExtraVarsInput>,
    no_input: bool,
    editor: &dyn Editor,
) -> Result<Option<String>> {
    if let Some(input) = input {
        debug!(template_id = template.id, "Using call-time extra variables");
        return input.into_text().map(Some);
    }

    if template.ask_variables_on_launch && !no_input {
        debug!(template_id = template.id, "Prompting for extra variables");
        let initial = format!(
            "{}{}",
            EDITOR_HINT,
            template.extra_vars.as_deref().unwrap_or_default()
        );
        let edited = editor.edit(&initial)?;
        return Ok(Some(strip_leading_comments(&edited).to_string()));
    }

    Ok(template.extra_vars.clone())
}
