//! OAuth layer: holds the module's endpoints and the current access token.

use connkit_ir::{ModuleDescriptor, OAuthDecl};

use super::type_prefix;
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::{UnitWriter, unit_name},
};

pub struct OAuthGenerator;

impl Generator for OAuthGenerator {
    fn name(&self) -> &'static str {
        "oauth"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject]
    }

    fn provides(&self) -> &[Role] {
        &[Role::ModuleObject]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        module.oauth.is_some()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let oauth = module
            .oauth
            .as_ref()
            .ok_or_else(|| GenerationError::descriptor(&module.name, "no oauth section"))?;
        let inner = ctx.lookup(&module.name, Role::ModuleObject)?.clone();
        let name = format!("{}OAuthAdapter", type_prefix(module));

        let mut writer = UnitWriter::new();
        writer.runtime(["OAuthConfig", "OAuthState"]);

        writer.item(
            &Struct::new(&name)
                .doc(format!(
                    "Carries the OAuth state of `{}`.",
                    module.type_name()
                ))
                .field(Field::new("inner", &inner.rust_type))
                .field(Field::new("oauth", "OAuthState").private()),
        );

        writer.item(
            &Impl::new(&name)
                .method(
                    Fn::new("new")
                        .param(Param::new("inner", &inner.rust_type))
                        .returns("Self")
                        .body("Self {\n    inner,\n    oauth: OAuthState::new(Self::oauth_config()),\n}"),
                )
                .method(
                    Fn::new("oauth_config")
                        .doc("Endpoints declared by the module.")
                        .returns("OAuthConfig")
                        .body(&config_literal(oauth)),
                )
                .method(
                    Fn::new("oauth_state")
                        .receiver(Receiver::Ref)
                        .returns("&OAuthState")
                        .body_line("&self.oauth"),
                ),
        );

        let handle = TypeHandle::generated(&name, unit_name(&module.name, "oauth"), self.name())
            .wrapping("inner", format!("{}::new", name));
        ctx.emit(writer.finish(&module.name, self.name(), "oauth"));
        ctx.register(&module.name, Role::ModuleObject, handle);
        Ok(())
    }
}

fn config_literal(oauth: &OAuthDecl) -> String {
    let optional = |value: &Option<String>| match value {
        Some(v) => format!("Some(String::from({:?}))", v),
        None => "None".to_string(),
    };
    format!(
        "OAuthConfig {{\n    authorization_url: String::from({:?}),\n    access_token_url: String::from({:?}),\n    scope: {},\n    callback_path: {},\n}}",
        oauth.authorization_url,
        oauth.access_token_url,
        optional(&oauth.scope),
        optional(&oauth.callback_path),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generators::fixtures, lints::fixtures as modules};

    fn module() -> ModuleDescriptor {
        let mut module = modules::module();
        module.oauth = Some(OAuthDecl {
            authorization_url: "https://crm.example.com/authorize".into(),
            access_token_url: "https://crm.example.com/token".into(),
            scope: Some("read write".into()),
            callback_path: None,
        });
        module
    }

    #[test]
    fn test_config_literal() {
        let code = config_literal(module().oauth.as_ref().unwrap());
        insta::assert_snapshot!(code, @r#"
        OAuthConfig {
            authorization_url: String::from("https://crm.example.com/authorize"),
            access_token_url: String::from("https://crm.example.com/token"),
            scope: Some(String::from("read write")),
            callback_path: None,
        }
        "#);
    }

    #[test]
    fn test_adapter_wraps_outermost_layer() {
        let mut module = module();
        module.connect = Some(modules::connect());

        let ctx = fixtures::run(module);
        let code = &ctx.units.get("crm/oauth.rs").unwrap().content;
        assert!(code.contains("pub inner: CrmConnectionManager,"));
        assert!(code.contains("oauth: OAuthState::new(Self::oauth_config()),"));

        let outer = ctx.roles.lookup("crm", Role::ModuleObject).unwrap();
        assert_eq!(outer.rust_type, "CrmOAuthAdapter");
        assert_eq!(
            ctx.roles
                .layer_path("crm", "CrmOAuthAdapter", "CrmConnectionManager")
                .as_deref(),
            Some(".inner")
        );
    }
}
