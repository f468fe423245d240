//! Keyless pool layer for poolable modules without a connect triple.

use connkit_ir::ModuleDescriptor;

use super::{pooling_profile_expr, type_prefix};
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::{UnitWriter, unit_name},
};

pub struct PoolAdapterGenerator;

impl Generator for PoolAdapterGenerator {
    fn name(&self) -> &'static str {
        "pool-adapter"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectorObject, Role::Config]
    }

    fn provides(&self) -> &[Role] {
        &[Role::ModuleObject, Role::PoolObject]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        module.uses_object_pool()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let instance = ctx.lookup(&module.name, Role::ConnectorObject)?.clone();
        let config = ctx.lookup(&module.name, Role::Config)?.rust_type.clone();
        let name = format!("{}PoolAdapter", type_prefix(module));
        let pool_type = format!("ModulePool<{}>", instance.rust_type);

        let mut writer = UnitWriter::new();
        writer.runtime(["BoxError", "ModulePool", "PoolableModule", "PoolingProfile", "module_pool"]);
        let profile = pooling_profile_expr(module, &mut writer);

        writer.item(
            &Impl::new(&instance.rust_type)
                .for_trait("PoolableModule")
                .assoc_type("Config", &config)
                .method(
                    Fn::new("create")
                        .private()
                        .param(Param::new("config", format!("&{}", config)))
                        .returns("Result<Self, BoxError>")
                        .body_line(format!("Ok({})", instance.construct("config.instantiate()"))),
                ),
        );

        writer.item(
            &Struct::new(&name)
                .doc(format!(
                    "Reuses `{}` instances through a keyless pool.",
                    module.type_name()
                ))
                .field(Field::new("pool", &pool_type).private()),
        );

        writer.item(
            &Impl::new(&name)
                .method(
                    Fn::new("new")
                        .doc("A pool using the module's default pooling profile.")
                        .param(Param::new("config", &config))
                        .returns("Self")
                        .body_line("Self::with_profile(config, Self::default_profile())"),
                )
                .method(
                    Fn::new("with_profile")
                        .param(Param::new("config", &config))
                        .param(Param::new("profile", "Option<PoolingProfile>"))
                        .returns("Self")
                        .body("Self {\n    pool: module_pool(config, profile.as_ref()),\n}"),
                )
                .method(
                    Fn::new("default_profile")
                        .returns("Option<PoolingProfile>")
                        .body_line(profile),
                )
                .method(
                    Fn::new("pool")
                        .receiver(Receiver::Ref)
                        .returns(format!("&{}", pool_type))
                        .body_line("&self.pool"),
                )
                .method(
                    Fn::new("config")
                        .receiver(Receiver::Ref)
                        .returns(format!("&{}", config))
                        .body_line("self.pool.factory().config()"),
                ),
        );

        let handle = TypeHandle::generated(&name, unit_name(&module.name, "pool"), self.name());
        ctx.emit(writer.finish(&module.name, self.name(), "pool"));
        ctx.register(&module.name, Role::PoolObject, handle.clone());
        ctx.register(&module.name, Role::ModuleObject, handle);
        Ok(())
    }
}
