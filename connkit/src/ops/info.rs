//! Info operation - module descriptor summary.

use std::path::Path;

use connkit_ir::{ModuleDescriptor, Operation};

use crate::reports::{ConnectInfo, InfoReport, OperationInfo};

/// Execute the info operation.
pub fn info(module: &ModuleDescriptor, config_path: &Path) -> InfoReport {
    let capabilities = [
        (!module.lifecycle.is_empty()).then_some("lifecycle"),
        module.uses_object_pool().then_some("pooling"),
        module.is_connection_managed().then_some("connection management"),
        module.oauth.as_ref().map(|_| "oauth"),
    ]
    .into_iter()
    .flatten()
    .map(String::from)
    .collect();

    let connect = module.connect.as_ref().map(|c| ConnectInfo {
        method: c.connect.clone(),
        disconnect: c.disconnect.clone(),
        validate: c.validate.clone(),
        key_params: c.key_params().map(|p| format!("{}: {}", p.name, p.ty)).collect(),
        extra_params: c
            .extra_params()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect(),
    });

    let operations = module.operations.iter().map(operation_info).collect();
    let sources = module
        .sources
        .iter()
        .map(|source| operation_info(&source.as_operation()))
        .collect();

    let conversions = module
        .enums
        .iter()
        .map(|e| format!("{} ({})", e.type_path, e.variants.join(", ")))
        .chain(module.transformers.iter().map(|t| {
            let mut line = format!("{}: {} -> {}", t.method, t.from, t.to);
            if t.weight != 0 {
                line.push_str(&format!(" (weight {})", t.weight));
            }
            line
        }))
        .collect();

    InfoReport {
        name: module.name.clone(),
        type_path: module.type_path.clone(),
        description: module.description.clone(),
        config_path: std::fs::canonicalize(config_path)
            .unwrap_or_else(|_| config_path.to_path_buf()),
        capabilities,
        fields: module
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.rust_type()))
            .collect(),
        connect,
        operations,
        sources,
        conversions,
    }
}

fn operation_info(op: &Operation) -> OperationInfo {
    OperationInfo {
        name: op.name.clone(),
        returns: op.returns.as_ref().map(ToString::to_string),
        retry_max: op.retry_max,
        invalidate_on: op.invalidate_on.clone(),
        params: op
            .params
            .iter()
            .map(|p| format!("{}: {} ({})", p.name, p.ty, p.kind.as_str()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_lists_sources_and_conversions() {
        let manifest: connkit_manifest::Manifest = r#"
[module]
name = "crm"
type = "crate::Crm"

[[sources]]
name = "watch"

[[sources.params]]
name = "callback"
type = "SourceCallback"

[[enums]]
type = "crate::Status"
variants = ["Open", "Closed"]

[[transformers]]
method = "parse_region"
from = "String"
to = "crate::Region"
weight = 2
"#
        .parse()
        .unwrap();
        let module = connkit_codegen::lower(&manifest).unwrap();

        let report = info(&module, Path::new("connkit.toml"));
        assert_eq!(report.sources[0].name, "watch");
        assert_eq!(report.sources[0].params, ["callback: SourceCallback (source-callback)"]);
        assert_eq!(
            report.conversions,
            [
                "crate::Status (Open, Closed)",
                "parse_region: String -> crate::Region (weight 2)",
            ]
        );
    }
}
