//! Transformer registration.
//!
//! Two layers share the `transformers` role. The enum layer gives every
//! declared enum `FromValue`/`IntoValue` impls and registers a string
//! transformer for it. The outer layer registers the module's conversion
//! functions after calling the enum layer, so
//! `<Module>Transformers::register` installs everything the module
//! declares.

use connkit_ir::{EnumDecl, ModuleDescriptor, TransformerDecl};
use tracing::debug;

use super::{qualified, type_prefix};
use crate::{
    ast::{Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::UnitWriter,
};

/// Role of the type whose `register` installs a module's transformers.
pub const TRANSFORMERS: Role = Role::Custom("transformers");

pub struct EnumTransformerGenerator;

impl Generator for EnumTransformerGenerator {
    fn name(&self) -> &'static str {
        "enum-transformers"
    }

    fn provides(&self) -> &[Role] {
        &[TRANSFORMERS]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        !module.enums.is_empty()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let name = format!("{}EnumTransformers", type_prefix(module));
        let mut writer = UnitWriter::new();
        writer.runtime([
            "TransformerRegistry",
            "ValueKind",
            "enum_transformer",
        ]);

        // Another module of this run may already have emitted the impls.
        let mut conversions = false;
        for decl in &module.enums {
            if ctx.claim(format!("enum:{}", decl.type_path)) {
                enum_impls(decl, &mut writer);
                conversions = true;
            } else {
                debug!(ty = %decl.type_path, module = %module.name, "enum conversions already emitted");
            }
        }
        if conversions {
            writer.runtime(["FromValue", "IntoValue", "TransformError", "Value", "ValueType"]);
        }

        let body = module
            .enums
            .iter()
            .map(|decl| {
                let variants = decl
                    .variants
                    .iter()
                    .map(|v| format!("{:?}", v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "registry.register(\n    ValueKind::String,\n    ValueKind::Named({path:?}),\n    enum_transformer({path:?}, &[{variants}]),\n);",
                    path = decl.type_path,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        writer.item(&Struct::new(&name).doc(format!(
            "Registers string conversions for the enums of the `{}` module.",
            module.name
        )));
        writer.item(
            &Impl::new(&name).method(
                Fn::new("register")
                    .param(Param::new("registry", "&TransformerRegistry"))
                    .body(&body),
            ),
        );

        ctx.emit(writer.finish(&module.name, self.name(), "enums"));
        ctx.register(
            &module.name,
            TRANSFORMERS,
            TypeHandle::generated(&name, format!("{}/enums.rs", module.name), self.name()),
        );
        Ok(())
    }
}

fn enum_impls(decl: &EnumDecl, writer: &mut UnitWriter) {
    let path = &decl.type_path;
    let from_arms: String = decl
        .variants
        .iter()
        .map(|v| format!("    Some({v:?}) => Ok({path}::{v}),\n"))
        .collect();
    let into_arms: String = decl
        .variants
        .iter()
        .map(|v| format!("    {path}::{v} => {v:?},\n"))
        .collect();

    writer.item(
        &Impl::new(path)
            .for_trait("FromValue")
            .method(
                Fn::new("value_type")
                    .private()
                    .returns("ValueType")
                    .body_line(format!("ValueType::Named({:?})", path)),
            )
            .method(
                Fn::new("from_value")
                    .private()
                    .param(Param::new("value", "Value"))
                    .returns("Result<Self, TransformError>")
                    .body(&format!(
                        "match value.as_str() {{\n{from_arms}    _ if value.is_null() => Err(TransformError::Missing),\n    _ => Err(TransformError::Conversion {{\n        value: value.to_string(),\n        target: {path:?}.to_string(),\n    }}),\n}}"
                    )),
            ),
    );
    writer.item(
        &Impl::new(path).for_trait("IntoValue").method(
            Fn::new("into_value")
                .private()
                .receiver(Receiver::Owned)
                .returns("Value")
                .body(&format!(
                    "let name = match self {{\n{into_arms}}};\nValue::from(name)"
                )),
        ),
    );
}

pub struct TransformerGenerator;

impl Generator for TransformerGenerator {
    fn name(&self) -> &'static str {
        "transformers"
    }

    /// Chained after the enum layer, which also provides the role.
    fn provides(&self) -> &[Role] {
        &[TRANSFORMERS]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        module.has_transformers()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let name = format!("{}Transformers", type_prefix(module));
        let inner = ctx.lookup(&module.name, TRANSFORMERS).ok().cloned();

        let mut writer = UnitWriter::new();
        writer.runtime(["TransformError", "TransformerRegistry"]);
        if !module.transformers.is_empty() {
            writer.runtime(["DEFAULT_WEIGHT"]);
        }

        let mut body: Vec<String> = inner
            .iter()
            .map(|handle| format!("{}::register(registry);", handle.rust_type))
            .collect();
        body.extend(
            module
                .transformers
                .iter()
                .map(|t| registration(&module.type_path, t)),
        );
        body.push("Ok(())".to_string());

        writer.item(&Struct::new(&name).doc(format!(
            "Installs every transformer the `{}` module declares. Call once at startup with the evaluator's registry.",
            module.name
        )));
        writer.item(
            &Impl::new(&name).method(
                Fn::new("register")
                    .param(Param::new("registry", "&TransformerRegistry"))
                    .returns("Result<(), TransformError>")
                    .body(&body.join("\n")),
            ),
        );

        ctx.emit(writer.finish(&module.name, self.name(), "transformers"));
        ctx.register(
            &module.name,
            TRANSFORMERS,
            TypeHandle::generated(
                &name,
                format!("{}/transformers.rs", module.name),
                self.name(),
            ),
        );
        Ok(())
    }
}

fn registration(type_path: &str, t: &TransformerDecl) -> String {
    let weight = match t.weight {
        0 => "DEFAULT_WEIGHT".to_string(),
        w if w > 0 => format!("DEFAULT_WEIGHT + {}", w),
        w => format!("DEFAULT_WEIGHT - {}", w.unsigned_abs()),
    };
    format!(
        "registry.register_fn::<{from}, {to}, _, _>(\n    {method:?},\n    {weight},\n    {type_path}::{method},\n)?;",
        from = qualified(&t.from),
        to = qualified(&t.to),
        method = t.method,
    )
}
