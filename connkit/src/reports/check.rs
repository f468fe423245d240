//! Check command report data structures.

use super::output::{Output, Report};

/// Report data from linting.
#[derive(Debug)]
pub struct CheckReport {
    /// Manifests that were checked.
    pub config_paths: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub infos: Vec<String>,
}

impl CheckReport {
    /// Whether the check passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for error in &self.errors {
            out.warning(&format!("error: {}", error));
        }

        for warning in &self.warnings {
            out.warning(&format!("warning: {}", warning));
        }

        for info in &self.infos {
            out.preformatted(&format!("info: {}", info));
        }

        if !self.warnings.is_empty() || !self.errors.is_empty() {
            out.newline();
        }

        if self.is_valid() {
            for path in &self.config_paths {
                out.preformatted(&format!("✓ {} is valid", path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::BufferOutput;

    #[test]
    fn test_errors_go_to_stderr() {
        let report = CheckReport {
            config_paths: vec!["connkit.toml".into()],
            errors: vec!["[connection-field] no oauth\n  --> crm".into()],
            warnings: Vec::new(),
            infos: Vec::new(),
        };
        let mut out = BufferOutput::default();
        report.render(&mut out);

        assert!(!report.is_valid());
        assert_eq!(out.stderr, ["error: [connection-field] no oauth\n  --> crm"]);
        assert!(out.stdout.iter().all(|l| !l.contains("is valid")));
    }
}
