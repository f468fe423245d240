//! `<Module>Config`: the configurable fields copied into every instance.

use connkit_ir::{ConfigurableField, ModuleDescriptor};

use super::{qualified_optional, type_prefix};
use crate::{
    ast::{Field, Fn, Impl, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::{UnitWriter, unit_name},
};

pub struct ConfigGenerator;

impl Generator for ConfigGenerator {
    fn name(&self) -> &'static str {
        "config"
    }

    fn provides(&self) -> &[Role] {
        &[Role::Config]
    }

    /// Only pooled and connection-managed modules create instances
    /// themselves.
    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        module.poolable || module.connect.is_some()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let name = format!("{}Config", type_prefix(module));
        let mut writer = UnitWriter::new();

        writer.item(
            &Struct::new(&name)
                .doc(format!(
                    "Configuration copied into every `{}` instance.",
                    module.type_name()
                ))
                .derive("Debug")
                .derive("Clone")
                .fields(
                    module
                        .fields
                        .iter()
                        .map(|f| {
                            Field::new(&f.name, qualified_optional(&f.ty, f.optional))
                                .doc_opt(f.description.as_deref())
                        }),
                ),
        );

        let defaults: Vec<String> = module
            .fields
            .iter()
            .map(|f| format!("{}: {},", f.name, default_expr(f)))
            .collect();
        writer.item(
            &Impl::new(&name).for_trait("Default").method(
                Fn::new("default")
                    .private()
                    .returns("Self")
                    .body(&struct_literal("Self", &defaults, false)),
            ),
        );

        let copies: Vec<String> = module
            .fields
            .iter()
            .map(|f| format!("{0}: self.{0}.clone(),", f.name))
            .collect();
        let instantiate = if copies.is_empty() {
            format!("{}::default()", module.type_path)
        } else {
            struct_literal(&module.type_path, &copies, true)
        };
        writer.item(
            &Impl::new(&name).method(
                Fn::new("instantiate")
                    .doc("A new module instance carrying this configuration.")
                    .receiver(Receiver::Ref)
                    .returns(&module.type_path)
                    .body(&instantiate),
            ),
        );

        let unit = writer.finish(&module.name, self.name(), "config");
        ctx.register(
            &module.name,
            Role::Config,
            TypeHandle::generated(&name, unit_name(&module.name, "config"), self.name()),
        );
        ctx.emit(unit);
        Ok(())
    }
}

fn default_expr(field: &ConfigurableField) -> String {
    match &field.default {
        Some(default) if field.rust_type().starts_with("Option<") => {
            format!("Some({})", default.to_rust_literal())
        }
        Some(default) => default.to_rust_literal(),
        None => "Default::default()".to_string(),
    }
}

fn struct_literal(path: &str, fields: &[String], rest: bool) -> String {
    let mut lines = vec![format!("{} {{", path)];
    lines.extend(fields.iter().map(|f| format!("    {}", f)));
    if rest {
        lines.push("    ..Default::default()".to_string());
    }
    lines.push("}".to_string());
    lines.join("\n")
}
