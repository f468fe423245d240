//! `Capabilities` impl on the outermost module object.
//!
//! A capability is reported only when its layer can be reached from the
//! outermost object through wrapping fields. Layers held inside a pool
//! belong to the pooled instances, not the module.

use connkit_ir::ModuleDescriptor;

use super::layer_from;
use crate::{
    ast::{Fn, Impl, Receiver},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::Role,
    unit::UnitWriter,
};

pub struct CapabilitiesGenerator;

impl Generator for CapabilitiesGenerator {
    fn name(&self) -> &'static str {
        "capabilities"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject]
    }

    fn reads(&self) -> &[Role] {
        &[Role::PoolObject, Role::ConnectionManager]
    }

    fn provides(&self) -> &[Role] {
        &[]
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let outer = ctx.lookup(&module.name, Role::ModuleObject)?.rust_type.clone();
        let path = |target: &str| ctx.roles.layer_path(&module.name, &outer, target);

        let lifecycle = layer_from(ctx, module, "lifecycle")
            .and_then(|layer| path(&layer.rust_type))
            .map(|p| format!("Some(self{}.lifecycle_state())", p));
        let pooling = ctx
            .roles
            .lookup(&module.name, Role::PoolObject)
            .ok()
            .and_then(|pool| path(&pool.rust_type))
            .map(|p| format!("Some(self{}.pool())", p));
        let connections = ctx
            .roles
            .lookup(&module.name, Role::ConnectionManager)
            .ok()
            .and_then(|manager| path(&manager.rust_type))
            .map(|p| format!("Some(self{}.connection_manager())", p));
        let oauth = layer_from(ctx, module, "oauth")
            .and_then(|layer| path(&layer.rust_type))
            .map(|p| format!("Some(self{}.oauth_state())", p));

        let mut writer = UnitWriter::new();
        writer.runtime(["Capabilities"]);
        let mut imp = Impl::new(&outer).for_trait("Capabilities");

        if let Some(body) = lifecycle {
            writer.runtime(["LifecycleState"]);
            imp = imp.method(method("lifecycle", "Option<&LifecycleState>", body));
        }
        if let Some(body) = pooling {
            writer.runtime(["Pooling"]);
            imp = imp.method(method("pooling", "Option<&dyn Pooling>", body));
        }
        if let Some(body) = connections {
            writer.runtime(["ConnectionManagement"]);
            imp = imp.method(method(
                "connection_management",
                "Option<&dyn ConnectionManagement>",
                body,
            ));
        }
        if let Some(body) = oauth {
            writer.runtime(["OAuthState"]);
            imp = imp.method(method("oauth", "Option<&OAuthState>", body));
        }

        writer.item(&imp);
        ctx.emit(writer.finish(&module.name, self.name(), "capabilities"));
        Ok(())
    }
}

fn method(name: &str, returns: &str, body: String) -> Fn {
    Fn::new(name)
        .private()
        .receiver(Receiver::Ref)
        .returns(returns)
        .body_line(body)
}

#[cfg(test)]
mod tests {
    use connkit_ir::OAuthDecl;

    use super::*;
    use crate::{generators::fixtures, lints::fixtures as modules};

    #[test]
    fn test_plain_module_has_no_capabilities() {
        let code = fixtures::unit(modules::module(), "crm/capabilities.rs");
        assert!(code.contains("impl Capabilities for crate::Crm {}"));
    }

    #[test]
    fn test_lifecycle_and_pool() {
        let mut module = modules::module();
        module.lifecycle.initialise = Some("init".into());
        module.poolable = true;

        let code = fixtures::unit(module, "crm/capabilities.rs");
        assert!(code.contains("impl Capabilities for CrmPoolAdapter {"));
        assert!(code.contains("Some(self.pool())"));
        // the lifecycle adapter lives inside the pool
        assert!(!code.contains("fn lifecycle("));
    }

    #[test]
    fn test_oauth_over_connection_manager() {
        let mut module = modules::module();
        module.connect = Some(modules::connect());
        module.lifecycle.start = Some("start".into());
        module.oauth = Some(OAuthDecl {
            authorization_url: "https://a".into(),
            access_token_url: "https://t".into(),
            scope: None,
            callback_path: None,
        });

        let code = fixtures::unit(module, "crm/capabilities.rs");
        assert!(code.contains("impl Capabilities for CrmOAuthAdapter {"));
        assert!(code.contains("Some(self.inner.connection_manager())"));
        assert!(code.contains("Some(self.oauth_state())"));
        assert!(!code.contains("lifecycle_state"));
    }

    #[test]
    fn test_lifecycle_only() {
        let mut module = modules::module();
        module.lifecycle.stop = Some("halt".into());

        let code = fixtures::unit(module, "crm/capabilities.rs");
        assert!(code.contains("fn lifecycle(&self) -> Option<&LifecycleState> {\n        Some(self.lifecycle_state())\n    }"));
    }
}
