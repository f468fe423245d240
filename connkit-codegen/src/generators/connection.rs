//! Connection layer: key type, `ManagedConnection` impl and manager.

use connkit_ir::{ConnectTriple, ModuleDescriptor};

use super::{path_to, pooling_profile_expr, qualified, qualified_optional, type_prefix};
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    builder::CodeFragment,
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::{Role, TypeHandle},
    unit::{UnitWriter, unit_name},
};

pub struct ConnectionManagerGenerator;

impl Generator for ConnectionManagerGenerator {
    fn name(&self) -> &'static str {
        "connection-manager"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectorObject, Role::Config]
    }

    fn provides(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectionKey, Role::ConnectionManager]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        module.connect.is_some()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let connect = module
            .connect
            .as_ref()
            .ok_or_else(|| GenerationError::descriptor(&module.name, "no connect triple"))?;
        let connection = ctx.lookup(&module.name, Role::ConnectorObject)?.clone();
        let config = ctx.lookup(&module.name, Role::Config)?.rust_type.clone();
        let user = path_to(ctx, module, &connection.rust_type, &module.type_path)?;

        let prefix = type_prefix(module);
        let key = format!("{}ConnectionKey", prefix);
        let manager = format!("{}ConnectionManager", prefix);

        let mut writer = UnitWriter::new();
        writer.import("std::hash", "Hash");
        writer.import("std::hash", "Hasher");
        writer.runtime([
            "ConnectionError",
            "ConnectionKey",
            "ConnectionManager",
            "KeyHasher",
            "ManagedConnection",
            "PoolError",
            "PoolingProfile",
            "Value",
        ]);

        emit_key(&mut writer, module, connect, &key);
        emit_managed_connection(&mut writer, connect, &connection, &config, &key, &user);
        let profile = pooling_profile_expr(module, &mut writer);
        emit_manager(&mut writer, module, connect, &connection.rust_type, &config, &key, &manager, profile);

        let unit = unit_name(&module.name, "connection");
        ctx.emit(writer.finish(&module.name, self.name(), "connection"));
        ctx.register(
            &module.name,
            Role::ConnectionKey,
            TypeHandle::generated(&key, &unit, self.name()),
        );
        let handle = TypeHandle::generated(&manager, &unit, self.name());
        ctx.register(&module.name, Role::ConnectionManager, handle.clone());
        ctx.register(&module.name, Role::ModuleObject, handle);
        Ok(())
    }
}

/// The key struct. Equality and hashing cover the key parameters only;
/// the other connect parameters ride along for `open`.
fn emit_key(writer: &mut UnitWriter, module: &ModuleDescriptor, connect: &ConnectTriple, key: &str) {
    let keys: Vec<_> = connect.key_params().collect();
    let extras: Vec<_> = connect.extra_params().collect();

    writer.item(
        &Struct::new(key)
            .doc(format!(
                "Identity of a pooled `{}` connection.",
                module.type_name()
            ))
            .derive("Debug")
            .derive("Clone")
            .fields(keys.iter().map(|p| Field::new(&p.name, qualified(&p.ty))))
            .fields(
                extras
                    .iter()
                    .map(|p| Field::new(&p.name, qualified_optional(&p.ty, true))),
            ),
    );

    let mut init: Vec<String> = keys.iter().map(|p| format!("    {},", p.name)).collect();
    init.extend(extras.iter().map(|p| format!("    {}: None,", p.name)));
    let new = keys
        .iter()
        .fold(Fn::new("new"), |f, p| f.param(Param::new(&p.name, qualified(&p.ty))))
        .returns("Self")
        .body(&format!("Self {{\n{}\n}}", init.join("\n")));
    let setters = extras.iter().map(|p| {
        Fn::new(format!("with_{}", p.name))
            .receiver(Receiver::OwnedMut)
            .param(Param::new(&p.name, qualified(&p.ty)))
            .returns("Self")
            .body(&format!("self.{0} = Some({0});\nself", p.name))
    });
    writer.item(&Impl::new(key).method(new).methods(setters));

    let (other, eq) = if keys.is_empty() {
        ("_other", "true".to_string())
    } else {
        (
            "other",
            keys.iter()
                .map(|p| format!("self.{0} == other.{0}", p.name))
                .collect::<Vec<_>>()
                .join(" && "),
        )
    };
    writer.item(
        &Impl::new(key).for_trait("PartialEq").method(
            Fn::new("eq")
                .private()
                .receiver(Receiver::Ref)
                .param(Param::new(other, "&Self"))
                .returns("bool")
                .body_line(eq),
        ),
    );
    writer.item(&Impl::new(key).for_trait("Eq"));
    writer.item(
        &Impl::new(key).for_trait("Hash").method(
            Fn::new("hash")
                .private()
                .generics("H: Hasher")
                .receiver(Receiver::Ref)
                .param(Param::new("state", "&mut H"))
                .body_line("state.write_i32(self.key_hash());"),
        ),
    );

    let hash = keys.iter().fold("KeyHasher::new()".to_string(), |acc, p| {
        format!("{}\n    .field(&self.{})", acc, p.name)
    });
    let describe = if keys.is_empty() {
        "\"[]\".to_string()".to_string()
    } else {
        let pattern = keys
            .iter()
            .map(|p| format!("{} = {{:?}}", p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let args = keys
            .iter()
            .map(|p| format!("self.{}", p.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!("format!(\"[{}]\", {})", pattern, args)
    };
    writer.item(
        &Impl::new(key)
            .for_trait("ConnectionKey")
            .method(
                Fn::new("key_hash")
                    .private()
                    .receiver(Receiver::Ref)
                    .returns("i32")
                    .body(&format!("{}\n    .finish()", hash)),
            )
            .method(
                Fn::new("describe")
                    .private()
                    .receiver(Receiver::Ref)
                    .returns("String")
                    .body_line(describe),
            ),
    );
}

fn emit_managed_connection(
    writer: &mut UnitWriter,
    connect: &ConnectTriple,
    connection: &TypeHandle,
    config: &str,
    key: &str,
    user: &str,
) {
    let mut open = Fn::new("open")
        .private()
        .receiver(Receiver::Mut)
        .param(Param::new("key", format!("&{}", key)))
        .returns("Result<(), ConnectionError>");
    for p in connect.extra_params() {
        open = open.body_fragment(CodeFragment::block_with_close(
            format!("let {} = key.{}.clone().ok_or_else(|| {{", p.name, p.name),
            vec![CodeFragment::line(format!(
                "ConnectionError::new(\"connection parameter '{}' is not set\")",
                p.name
            ))],
            "})?;",
        ));
    }
    let args = connect
        .params
        .iter()
        .map(|p| {
            if p.is_key {
                format!("key.{}.clone()", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    open = open.body(&format!(
        "self{}\n    .{}({})\n    .map_err(ConnectionError::from_error)",
        user, connect.connect, args
    ));

    let is_valid = Fn::new("is_valid")
        .private()
        .receiver(Receiver::Ref)
        .returns("Result<bool, ConnectionError>");
    let is_valid = match &connect.validate {
        Some(validate) => is_valid.body_line(format!(
            "self{}.{}().map_err(ConnectionError::from_error)",
            user, validate
        )),
        None => is_valid.body_line("Ok(false)"),
    };

    let mut imp = Impl::new(&connection.rust_type)
        .for_trait("ManagedConnection")
        .assoc_type("Key", key)
        .assoc_type("Config", config)
        .method(
            Fn::new("create")
                .private()
                .param(Param::new("config", format!("&{}", config)))
                .returns("Result<Self, ConnectionError>")
                .body_line(format!("Ok({})", connection.construct("config.instantiate()"))),
        )
        .method(open)
        .method(
            Fn::new("close")
                .private()
                .receiver(Receiver::Mut)
                .returns("Result<(), ConnectionError>")
                .body_line(format!(
                    "self{}.{}().map_err(ConnectionError::from_error)",
                    user, connect.disconnect
                )),
        )
        .method(is_valid);
    if let Some(identifier) = &connect.identifier {
        imp = imp.method(
            Fn::new("connection_id")
                .private()
                .receiver(Receiver::Ref)
                .returns("String")
                .body_line(format!("self{}.{}().to_string()", user, identifier)),
        );
    }
    writer.item(&imp);
}

#[allow(clippy::too_many_arguments)]
fn emit_manager(
    writer: &mut UnitWriter,
    module: &ModuleDescriptor,
    connect: &ConnectTriple,
    connection: &str,
    config: &str,
    key: &str,
    manager: &str,
    profile: String,
) {
    let inner = format!("ConnectionManager<{}>", connection);

    writer.item(
        &Struct::new(manager)
            .doc(format!(
                "Hands out pooled `{}` connections by key.",
                module.type_name()
            ))
            .fields(connect.params.iter().map(|p| {
                Field::new(&p.name, "Option<Value>").doc(format!(
                    "Module-level source of the `{}` connect parameter.",
                    p.name
                ))
            }))
            .field(Field::new("manager", &inner).private()),
    );

    let mut init: Vec<String> = connect
        .params
        .iter()
        .map(|p| format!("    {}: None,", p.name))
        .collect();
    init.push("    manager: ConnectionManager::new(config, profile),".to_string());

    let setters = connect.params.iter().map(|p| {
        Fn::new(format!("with_{}", p.name))
            .receiver(Receiver::OwnedMut)
            .param(Param::new("value", "impl Into<Value>"))
            .returns("Self")
            .body(&format!("self.{} = Some(value.into());\nself", p.name))
    });

    writer.item(
        &Impl::new(manager)
            .method(
                Fn::new("new")
                    .doc("A manager using the module's default pooling profile.")
                    .param(Param::new("config", config))
                    .returns("Self")
                    .body_line("Self::with_profile(config, Self::default_profile())"),
            )
            .method(
                Fn::new("with_profile")
                    .param(Param::new("config", config))
                    .param(Param::new("profile", "Option<PoolingProfile>"))
                    .returns("Self")
                    .body(&format!("Self {{\n{}\n}}", init.join("\n"))),
            )
            .method(
                Fn::new("default_profile")
                    .returns("Option<PoolingProfile>")
                    .body_line(profile),
            )
            .methods(setters)
            .method(
                Fn::new("config")
                    .receiver(Receiver::Ref)
                    .returns(format!("&{}", config))
                    .body_line("self.manager.config()"),
            )
            .method(
                Fn::new("connection_manager")
                    .receiver(Receiver::Ref)
                    .returns(format!("&{}", inner))
                    .body_line("&self.manager"),
            )
            .method(
                Fn::new("acquire_connection")
                    .receiver(Receiver::Ref)
                    .param(Param::new("key", format!("&{}", key)))
                    .returns(format!("Result<{}, PoolError>", connection))
                    .body_line("self.manager.acquire_connection(key)"),
            )
            .method(
                Fn::new("release_connection")
                    .receiver(Receiver::Ref)
                    .param(Param::new("key", format!("&{}", key)))
                    .param(Param::new("connection", connection))
                    .returns("Result<(), PoolError>")
                    .body_line("self.manager.release_connection(key, connection)"),
            )
            .method(
                Fn::new("destroy_connection")
                    .receiver(Receiver::Ref)
                    .param(Param::new("key", format!("&{}", key)))
                    .param(Param::new("connection", connection))
                    .returns("Result<(), PoolError>")
                    .body_line("self.manager.destroy_connection(key, connection)"),
            ),
    );
}
