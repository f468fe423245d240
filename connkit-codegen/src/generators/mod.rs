//! Core generators.
//!
//! Each capability generator wraps the current module-object holder of its
//! module and registers the wrapper as the new holder:
//!
//! ```text
//! user type → lifecycle adapter → pool adapter | connection manager → OAuth adapter
//! ```
//!
//! Later generators find the layers through the role registry only.
//! Processors and sources sit on top of the outermost layer; enum and
//! user transformers are registered independently of it.

mod capabilities;
mod config;
mod connection;
mod lifecycle;
mod oauth;
mod pool;
mod processor;
mod source;
mod transformers;

pub use capabilities::CapabilitiesGenerator;
pub use config::ConfigGenerator;
use connkit_ir::{ModuleDescriptor, Shape, TypeRef};
pub use connection::ConnectionManagerGenerator;
pub use lifecycle::LifecycleGenerator;
pub use oauth::OAuthGenerator;
pub use pool::PoolAdapterGenerator;
pub use processor::ProcessorGenerator;
pub use source::SourceGenerator;
pub use transformers::{EnumTransformerGenerator, TRANSFORMERS, TransformerGenerator};

use crate::{
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle, TypeOrigin},
    unit::UnitWriter,
};

/// The core generators, in pipeline order.
pub fn core() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(ConfigGenerator),
        Box::new(LifecycleGenerator),
        Box::new(PoolAdapterGenerator),
        Box::new(ConnectionManagerGenerator),
        Box::new(OAuthGenerator),
        Box::new(CapabilitiesGenerator),
        Box::new(ProcessorGenerator),
        Box::new(SourceGenerator),
        Box::new(EnumTransformerGenerator),
        Box::new(TransformerGenerator),
    ]
}

/// Prefix of every generated type name, e.g. `Salesforce`.
fn type_prefix(module: &ModuleDescriptor) -> String {
    connkit_core::to_pascal_case(&module.name)
}

/// A declared type spelled for generated code.
///
/// Units only import their parent module, so map types get full paths.
fn qualified(ty: &TypeRef) -> String {
    match ty.shape() {
        Shape::Scalar(_) | Shape::Named(_) => ty.as_str().to_string(),
        Shape::List(inner) => format!("Vec<{}>", qualified(inner)),
        Shape::Optional(inner) => format!("Option<{}>", qualified(inner)),
        Shape::Map(key, value) => {
            let head = ty.generic_head();
            let path = match head.rsplit("::").next().unwrap_or(head) {
                "HashMap" => "std::collections::HashMap",
                "BTreeMap" => "std::collections::BTreeMap",
                _ => "connkit_runtime::IndexMap",
            };
            format!("{}<{}, {}>", path, qualified(key), qualified(value))
        }
    }
}

/// [`qualified`], wrapped in `Option` when the declaration is optional.
fn qualified_optional(ty: &TypeRef, optional: bool) -> String {
    if optional && !ty.is_optional() {
        format!("Option<{}>", qualified(ty))
    } else {
        qualified(ty)
    }
}

/// Field path from a `from` value down to the `to` layer.
fn path_to(
    ctx: &GenerationContext,
    module: &ModuleDescriptor,
    from: &str,
    to: &str,
) -> Result<String, GenerationError> {
    ctx.roles
        .layer_path(&module.name, from, to)
        .ok_or_else(|| {
            GenerationError::descriptor(
                &module.name,
                format!("'{}' is not reachable from '{}'", to, from),
            )
        })
}

/// The module-object layer emitted by `generator`, if it ran.
fn layer_from(
    ctx: &GenerationContext,
    module: &ModuleDescriptor,
    generator: &'static str,
) -> Option<TypeHandle> {
    ctx.roles
        .layers(&module.name, Role::ModuleObject)
        .into_iter()
        .find(|h| h.origin == TypeOrigin::Generated(generator))
        .cloned()
}

/// Expression for the module's default pooling profile.
fn pooling_profile_expr(module: &ModuleDescriptor, writer: &mut UnitWriter) -> String {
    let Some(pooling) = &module.pooling else {
        return "None".to_string();
    };
    writer.runtime(["PoolingProfile"]);

    let mut fields = Vec::new();
    if let Some(v) = pooling.max_active {
        fields.push(format!("max_active: {}", v));
    }
    if let Some(v) = pooling.max_idle {
        fields.push(format!("max_idle: {}", v));
    }
    if let Some(v) = pooling.max_wait_ms {
        fields.push(format!("max_wait_ms: {}", v));
    }
    if let Some(action) = pooling.exhausted_action {
        writer.runtime(["ExhaustedAction"]);
        fields.push(format!("exhausted_action: ExhaustedAction::{}", action.as_str()));
    }

    if fields.is_empty() {
        "Some(PoolingProfile::default())".to_string()
    } else {
        format!(
            "Some(PoolingProfile {{ {}, ..PoolingProfile::default() }})",
            fields.join(", ")
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use connkit_ir::ModuleDescriptor;

    use crate::pipeline::{GenerationContext, Pipeline};

    /// Run the core pipeline over `module` and return the content of `unit`.
    pub fn unit(module: ModuleDescriptor, unit: &str) -> String {
        let ctx = run(module);
        ctx.units
            .get(unit)
            .map(|u| u.content.clone())
            .unwrap_or_else(|| panic!("unit '{}' was not generated", unit))
    }

    pub fn run(module: ModuleDescriptor) -> GenerationContext {
        Pipeline::new().run(&[module]).unwrap()
    }
}
