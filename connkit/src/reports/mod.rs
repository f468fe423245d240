//! Report data structures for commands.
//!
//! Commands build reports, then render them to an Output target.

mod check;
mod generate;
mod info;
mod output;
mod roles;

pub use check::CheckReport;
pub use generate::{GenerateReport, UnitPreview};
pub use info::{ConnectInfo, InfoReport, OperationInfo};
pub use output::{Report, TerminalOutput};
pub use roles::{ModuleRoles, RoleEntry, RolesReport};
