//! SQL echo formatting

/// Turns SQL text into what gets shown to the operator before execution
pub trait SqlFormatter: Send + Sync {
    fn format(&self, sql: &str) -> String;
}

/// Shows SQL exactly as it will be executed
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SqlFormatter for Passthrough {
    fn format(&self, sql: &str) -> String {
        sql.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_keeps_text() {
        let sql = "BEGIN;\nCREATE TABLE t (id INT);\nCOMMIT;\n";
        assert_eq!(Passthrough.format(sql), sql);
    }
}
