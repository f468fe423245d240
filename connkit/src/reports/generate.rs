//! Generate command report data structures.

use super::output::{Output, Report};

#[derive(Debug)]
pub struct UnitPreview {
    pub name: String,
    pub content: String,
}

/// Report data from a generation run.
#[derive(Debug)]
pub struct GenerateReport {
    /// A single unit was requested; print it without a banner.
    pub single: bool,
    pub units: Vec<UnitPreview>,
    pub warnings: Vec<String>,
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        for warning in &self.warnings {
            out.warning(warning);
        }

        if self.single {
            for unit in &self.units {
                out.preformatted(unit.content.trim_end());
            }
            return;
        }

        for (i, unit) in self.units.iter().enumerate() {
            if i > 0 {
                out.newline();
            }
            out.divider(&unit.name);
            out.preformatted(unit.content.trim_end());
        }
    }
}
