//! Lifecycle layer.
//!
//! With hooks declared, `<Module>LifecycleAdapter` wraps the user type and
//! runs each hook once per phase. Without hooks the user type gets an empty
//! `Lifecycle` impl and stays the module object.

use connkit_ir::ModuleDescriptor;

use super::type_prefix;
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::{UnitWriter, unit_name},
};

pub struct LifecycleGenerator;

const PHASES: [(&str, &str); 4] = [
    ("initialise", "Initialised"),
    ("start", "Started"),
    ("stop", "Stopped"),
    ("dispose", "Disposed"),
];

impl Generator for LifecycleGenerator {
    fn name(&self) -> &'static str {
        "lifecycle"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject]
    }

    fn provides(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectorObject]
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let inner = ctx.lookup(&module.name, Role::ModuleObject)?.clone();
        let mut writer = UnitWriter::new();
        writer.runtime(["Lifecycle"]);

        if module.lifecycle.is_empty() {
            writer.item(&Impl::new(&inner.rust_type).for_trait("Lifecycle"));
            ctx.emit(writer.finish(&module.name, self.name(), "lifecycle"));
            ctx.register(&module.name, Role::ConnectorObject, inner);
            return Ok(());
        }

        let name = format!("{}LifecycleAdapter", type_prefix(module));
        writer.runtime(["LifecycleError", "LifecyclePhase", "LifecycleState"]);

        writer.item(
            &Struct::new(&name)
                .doc(format!(
                    "Runs the lifecycle hooks of `{}` once per phase.",
                    module.type_name()
                ))
                .field(Field::new("inner", &inner.rust_type))
                .field(Field::new("lifecycle", "LifecycleState").private()),
        );

        writer.item(
            &Impl::new(&name)
                .method(
                    Fn::new("new")
                        .param(Param::new("inner", &inner.rust_type))
                        .returns("Self")
                        .body("Self {\n    inner,\n    lifecycle: LifecycleState::default(),\n}"),
                )
                .method(
                    Fn::new("lifecycle_state")
                        .receiver(Receiver::Ref)
                        .returns("&LifecycleState")
                        .body_line("&self.lifecycle"),
                ),
        );

        let hooks = [
            &module.lifecycle.initialise,
            &module.lifecycle.start,
            &module.lifecycle.stop,
            &module.lifecycle.dispose,
        ];
        let methods = PHASES.iter().zip(hooks).map(|((method, phase), hook)| {
            let call = match hook {
                Some(hook) => format!("self.inner.{}()", hook),
                None => "Ok::<(), LifecycleError>(())".to_string(),
            };
            Fn::new(*method)
                .private()
                .receiver(Receiver::Mut)
                .returns("Result<(), LifecycleError>")
                .body_line(format!(
                    "self.lifecycle.run(LifecyclePhase::{}, || {})",
                    phase, call
                ))
        });
        writer.item(&Impl::new(&name).for_trait("Lifecycle").methods(methods));

        let handle = TypeHandle::generated(&name, unit_name(&module.name, "lifecycle"), self.name())
            .wrapping("inner", format!("{}::new", name));
        ctx.emit(writer.finish(&module.name, self.name(), "lifecycle"));
        ctx.register(&module.name, Role::ModuleObject, handle.clone());
        ctx.register(&module.name, Role::ConnectorObject, handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generators::fixtures, lints::fixtures as modules};

    #[test]
    fn test_empty_impl_without_hooks() {
        let ctx = fixtures::run(modules::module());
        let code = &ctx.units.get("crm/lifecycle.rs").unwrap().content;
        assert!(code.contains("impl Lifecycle for crate::Crm {}"));

        let connector = ctx.roles.lookup("crm", Role::ConnectorObject).unwrap();
        assert_eq!(connector.rust_type, "crate::Crm");
        assert_eq!(ctx.roles.layers("crm", Role::ModuleObject).len(), 1);
    }

    #[test]
    fn test_adapter_runs_declared_hooks() {
        let mut module = modules::module();
        module.lifecycle.start = Some("open_session".into());
        module.lifecycle.dispose = Some("shutdown".into());

        let code = fixtures::unit(module, "crm/lifecycle.rs");
        assert!(code.contains("pub struct CrmLifecycleAdapter {\n    pub inner: crate::Crm,\n    lifecycle: LifecycleState,\n}"));
        assert!(code.contains(
            "self.lifecycle.run(LifecyclePhase::Started, || self.inner.open_session())"
        ));
        assert!(code.contains(
            "self.lifecycle.run(LifecyclePhase::Initialised, || Ok::<(), LifecycleError>(()))"
        ));
        assert!(code.contains("self.lifecycle.run(LifecyclePhase::Disposed, || self.inner.shutdown())"));
    }
}
