//! SQL echo highlighting through an external program

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tidemark_core::{Passthrough, SqlFormatter};

/// Pipes SQL through an external command, e.g. `pygmentize -l sql`
///
/// Falls back to the plain text when the command cannot be run.
#[derive(Debug, Clone)]
pub struct ExternalHighlighter {
    program: String,
    args: Vec<String>,
}

impl ExternalHighlighter {
    /// Split a command line on whitespace; `None` for an empty command
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn highlight(&self, sql: &str) -> io::Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("highlighter stdin unavailable"))?;
        let input = sql.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| io::Error::other("highlighter writer panicked"))??;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        String::from_utf8(output.stdout).map_err(io::Error::other)
    }
}

impl SqlFormatter for ExternalHighlighter {
    fn format(&self, sql: &str) -> String {
        match self.highlight(sql) {
            Ok(highlighted) => highlighted,
            Err(e) => {
                tracing::debug!("Highlighter {} unavailable: {}", self.program, e);
                sql.to_string()
            }
        }
    }
}

/// Pick the formatter for echoed SQL
pub fn formatter_for(command: Option<&str>) -> Arc<dyn SqlFormatter> {
    match command.and_then(ExternalHighlighter::parse) {
        Some(highlighter) => Arc::new(highlighter),
        None => Arc::new(Passthrough),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let highlighter = ExternalHighlighter::parse("pygmentize -l sql").unwrap();
        assert_eq!(highlighter.program, "pygmentize");
        assert_eq!(highlighter.args, vec!["-l", "sql"]);
        assert!(ExternalHighlighter::parse("   ").is_none());
    }

    #[test]
    fn test_missing_program_falls_back_to_plain_text() {
        let highlighter = ExternalHighlighter::parse("tidemark-no-such-highlighter").unwrap();
        assert_eq!(highlighter.format("SELECT 1;"), "SELECT 1;");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_of_program_is_used() {
        let highlighter = ExternalHighlighter::parse("tr a-z A-Z").unwrap();
        assert_eq!(highlighter.format("select 1;\n"), "SELECT 1;\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_falls_back_to_plain_text() {
        let highlighter = ExternalHighlighter::parse("false").unwrap();
        assert_eq!(highlighter.format("SELECT 1;"), "SELECT 1;");
    }

    #[test]
    fn test_no_command_is_passthrough() {
        assert_eq!(formatter_for(None).format("SELECT 1;"), "SELECT 1;");
        assert_eq!(formatter_for(Some("")).format("SELECT 1;"), "SELECT 1;");
    }
}
