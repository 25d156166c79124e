//! Helpful error types for the CLI
//!
//! Every error says what went wrong, where, and what to try next.

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    /// Neither a directory nor a single file was combined with templates
    pub fn missing_inputs() -> Self {
        Self::new("Nothing to do: no input and template combination given")
            .with_context("logtab needs captures (-f or -D) and templates (-t or -l)")
            .with_suggestions([
                "TRY: Parse one file with one template: logtab -f show_int.log -t int_brief.template",
                "TRY: Parse one file with a template list: logtab -f show_int.log -l templates.txt",
                "TRY: Build a CSV report for a directory: logtab -D captures/ -l templates.txt",
            ])
    }

    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("-D expects a directory of captures")
            .with_suggestions([
                format!("TRY: Parse a single capture with -f {}", path.display()),
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
            ])
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    pub fn cannot_read_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Captures must be UTF-8 text".to_string(),
            ])
    }

    /// The template list resolved to nothing
    pub fn empty_template_list(list: &Path) -> Self {
        Self::new(format!("No usable templates in {}", list.display()))
            .with_context("Every entry was blank, commented out, or missing on disk")
            .with_suggestions([
                "TRY: Paths in the list are relative to the list file's directory".to_string(),
                format!("TRY: Inspect the list: cat {}", list.display()),
            ])
    }

    pub fn invalid_template(path: &Path, reason: &str) -> Self {
        Self::new(format!("Invalid template: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Values go first, one 'Value [Options] NAME (regex)' per line".to_string(),
                "TRY: Separate the Value block and every state with a blank line".to_string(),
                "TRY: Every template needs a 'Start' state".to_string(),
            ])
    }

    pub fn cannot_write_report(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot write report: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Choose another location with -R <FILE>".to_string(),
                "TRY: Verify you have write permissions for the target directory".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While parsing captures")
            .with_suggestions(["TRY: again"]);

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While parsing captures"));
        assert!(display.contains("  TRY: again"));
    }

    #[test]
    fn test_missing_inputs_lists_every_mode() {
        let display = HelpfulError::missing_inputs().to_string();
        assert!(display.contains("-f show_int.log -t"));
        assert!(display.contains("-f show_int.log -l"));
        assert!(display.contains("-D captures/"));
    }

    #[test]
    fn test_empty_template_list_names_file() {
        let err = HelpfulError::empty_template_list(&PathBuf::from("/tmp/list.txt"));
        let display = format!("{}", err);
        assert!(display.contains("/tmp/list.txt"));
        assert!(display.contains("TRY:"));
    }
}
