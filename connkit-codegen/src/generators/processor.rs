//! One `MessageProcessor` per operation.
//!
//! Each processor resolves its module, evaluates its arguments from the
//! message and drives the call through `connkit_runtime::Invocation` in
//! one of three modes: on a managed connection, on a pooled instance, or
//! on the module object itself.

use connkit_ir::{ModuleDescriptor, Operation, Parameter, ParameterKind};
use tracing::debug;

use super::{path_to, qualified, qualified_optional};
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::Role,
    unit::{UnitWriter, unit_name},
};

pub struct ProcessorGenerator;

/// How the processor reaches the user type.
pub(super) enum Mode {
    Connected {
        manager_path: String,
        key: String,
        connection: String,
        user_path: String,
    },
    Pooled {
        pool_path: String,
        instance: String,
        user_path: String,
    },
    Direct {
        user_path: String,
    },
}

impl Generator for ProcessorGenerator {
    fn name(&self) -> &'static str {
        "message-processors"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectorObject]
    }

    fn reads(&self) -> &[Role] {
        &[Role::ConnectionManager, Role::ConnectionKey, Role::PoolObject]
    }

    fn provides(&self) -> &[Role] {
        &[]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        !module.operations.is_empty()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let (outer, mode) = resolve_mode(ctx, module)?;

        for op in &module.operations {
            let file = format!("{}_processor", connkit_core::to_snake_case(&op.name));
            debug!(operation = %op.name, unit = %unit_name(&module.name, &file), "emitting processor");

            let emitter = ProcessorEmitter {
                module,
                op,
                outer: &outer,
                mode: &mode,
            };
            let unit = emitter.emit().finish(&module.name, self.name(), &file);
            ctx.emit(unit);
        }
        Ok(())
    }
}

/// The outermost module type and the way its operations reach the user
/// type.
pub(super) fn resolve_mode(
    ctx: &GenerationContext,
    module: &ModuleDescriptor,
) -> Result<(String, Mode), GenerationError> {
    let outer = ctx.lookup(&module.name, Role::ModuleObject)?.rust_type.clone();
    let connector = ctx.lookup(&module.name, Role::ConnectorObject)?.rust_type.clone();

    let mode = if module.is_connection_managed() {
        let manager = ctx.lookup(&module.name, Role::ConnectionManager)?.rust_type.clone();
        let key = ctx.lookup(&module.name, Role::ConnectionKey)?.rust_type.clone();
        Mode::Connected {
            manager_path: path_to(ctx, module, &outer, &manager)?,
            key,
            user_path: path_to(ctx, module, &connector, &module.type_path)?,
            connection: connector,
        }
    } else if module.uses_object_pool() {
        let pool = ctx.lookup(&module.name, Role::PoolObject)?.rust_type.clone();
        Mode::Pooled {
            pool_path: path_to(ctx, module, &outer, &pool)?,
            user_path: path_to(ctx, module, &connector, &module.type_path)?,
            instance: connector,
        }
    } else {
        Mode::Direct {
            user_path: path_to(ctx, module, &outer, &module.type_path)?,
        }
    };
    Ok((outer, mode))
}

pub(super) struct ProcessorEmitter<'a> {
    pub(super) module: &'a ModuleDescriptor,
    pub(super) op: &'a Operation,
    pub(super) outer: &'a str,
    pub(super) mode: &'a Mode,
}

impl ProcessorEmitter<'_> {
    fn type_name(&self) -> String {
        format!("{}Processor", connkit_core::to_pascal_case(&self.op.name))
    }

    pub(super) fn connect_params(&self) -> Vec<(&str, String)> {
        match (self.mode, &self.module.connect) {
            (Mode::Connected { .. }, Some(connect)) => connect
                .params
                .iter()
                .map(|p| (p.name.as_str(), qualified(&p.ty)))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn uses_evaluator(&self) -> bool {
        matches!(self.mode, Mode::Connected { .. })
            || self
                .op
                .params
                .iter()
                .any(|p| p.kind.is_evaluated() || p.kind.is_invokable())
    }

    fn emit(&self) -> UnitWriter {
        let mut writer = UnitWriter::new();
        writer.import("std::sync", "Arc");
        writer.runtime([
            "ConfigRef",
            "Invocation",
            "InvocationError",
            "Message",
            "MessageProcessor",
            "Outcome",
            "ProcessError",
            "RetryState",
            "RuntimeContext",
        ]);
        self.imports(&mut writer);

        writer.item(&self.definition());
        writer.item(&self.builders());
        writer.item(
            &Impl::new(self.type_name())
                .for_trait("MessageProcessor")
                .method(
                    Fn::new("process")
                        .private()
                        .receiver(Receiver::Ref)
                        .param(Param::new("message", "Message"))
                        .returns("Result<Message, ProcessError>")
                        .body(&self.process_body()),
                ),
        );
        writer
    }

    pub(super) fn imports(&self, writer: &mut UnitWriter) {
        let params = &self.op.params;
        if params.iter().any(|p| p.kind.is_evaluated()) || !self.connect_params().is_empty() {
            writer.runtime(["Value"]);
        }
        if params.iter().any(|p| p.kind.is_invokable()) {
            writer.runtime(["ProcessorRef"]);
        }
        if params
            .iter()
            .any(|p| matches!(p.kind, ParameterKind::NestedInvokable { .. }))
        {
            writer.runtime(["NestedProcessor"]);
        }
        if params.iter().any(|p| p.kind == ParameterKind::Callback) {
            writer.runtime(["Callback"]);
        }
        if self.op.has_outbound_headers() {
            writer.runtime(["OutboundHeaders"]);
        }
        if params.iter().any(|p| p.kind == ParameterKind::ConnectionField) {
            writer.runtime(["Capabilities", "access_token"]);
        }
        if matches!(self.mode, Mode::Connected { .. }) {
            writer.runtime(["connect_param"]);
        }
    }

    /// Source fields shared by processors and sources.
    pub(super) fn fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::new("context", "Arc<RuntimeContext>").private(),
            Field::new("config", format!("ConfigRef<{}>", self.outer)).private(),
            Field::new("retry", "RetryState").private(),
        ];
        fields.extend(
            self.op
                .params
                .iter()
                .filter_map(|p| source_type(p).map(|ty| Field::new(&p.name, ty).private())),
        );
        fields.extend(
            self.connect_params()
                .into_iter()
                .map(|(name, _)| Field::new(name, "Option<Value>").private()),
        );
        fields
    }

    /// Initializers for [`Self::fields`], one per line.
    pub(super) fn field_inits(&self) -> Vec<String> {
        let mut init = vec![
            "    context,".to_string(),
            "    config,".to_string(),
            format!("    retry: RetryState::new({}),", self.op.retry_max),
        ];
        init.extend(
            self.op
                .params
                .iter()
                .filter_map(|p| source_init(p).map(|v| format!("    {}: {},", p.name, v))),
        );
        init.extend(
            self.connect_params()
                .into_iter()
                .map(|(name, _)| format!("    {}: None,", name)),
        );
        init
    }

    pub(super) fn new_fn(&self, extra_inits: &[String]) -> Fn {
        let mut init = self.field_inits();
        init.extend(extra_inits.iter().cloned());
        Fn::new("new")
            .param(Param::new("context", "Arc<RuntimeContext>"))
            .param(Param::new("config", format!("ConfigRef<{}>", self.outer)))
            .returns("Self")
            .body(&format!("Self {{\n{}\n}}", init.join("\n")))
    }

    pub(super) fn setters(&self) -> Vec<Fn> {
        self.op
            .params
            .iter()
            .filter_map(source_setter)
            .chain(self.connect_params().into_iter().map(|(name, _)| {
                Fn::new(format!("with_{}", name))
                    .doc(format!("Override the module-level `{}` for this operation.", name))
                    .receiver(Receiver::OwnedMut)
                    .param(Param::new("value", "impl Into<Value>"))
                    .returns("Self")
                    .body(&format!("self.{} = Some(value.into());\nself", name))
            }))
            .collect()
    }

    fn definition(&self) -> Struct {
        let def = Struct::new(self.type_name()).fields(self.fields());
        match &self.op.description {
            Some(description) => def.doc(description.clone()),
            None => def.doc(format!("Runs the `{}` operation.", self.op.name)),
        }
    }

    fn builders(&self) -> Impl {
        Impl::new(self.type_name())
            .method(self.new_fn(&[]))
            .methods(self.setters())
            .method(
                Fn::new("with_retry_max")
                    .receiver(Receiver::Owned)
                    .param(Param::new("max_retries", "u32"))
                    .returns("Self")
                    .body("self.retry.set_retry_max(max_retries);\nself"),
            )
            .method(
                Fn::new("retry_state")
                    .receiver(Receiver::Ref)
                    .returns("&RetryState")
                    .body_line("&self.retry"),
            )
    }

    pub(super) fn process_body(&self) -> String {
        let op = &self.op.name;
        let mut lines = vec![format!(
            "let module = self.config.resolve(&self.context.registry, {:?})?;",
            op
        )];
        if self.uses_evaluator() {
            lines.push("let evaluator = &self.context.evaluator;".to_string());
        }

        let mut args = Vec::new();
        let call = match self.mode {
            Mode::Connected {
                manager_path,
                connection,
                user_path,
                ..
            } => {
                lines.push(format!("let manager = &module{};", manager_path));
                args.push("manager.connection_manager()".to_string());
                args.push("message".to_string());
                args.push(self.key_closure());
                args.push(self.evaluate_closure());
                args.push(self.call_closure(
                    Some(format!("connection: &mut {}", connection)),
                    &format!("connection{}", user_path),
                ));
                "connected"
            }
            Mode::Pooled {
                pool_path,
                instance,
                user_path,
            } => {
                args.push(format!("module{}.pool()", pool_path));
                args.push("message".to_string());
                args.push(self.evaluate_closure());
                args.push(self.call_closure(
                    Some(format!("instance: &mut {}", instance)),
                    &format!("instance{}", user_path),
                ));
                "pooled"
            }
            Mode::Direct { user_path } => {
                if user_path.is_empty() {
                    lines.push("let target = &*module;".to_string());
                } else {
                    lines.push(format!("let target = &module{};", user_path));
                }
                args.push("message".to_string());
                args.push(self.evaluate_closure());
                args.push(self.call_closure(None, "target"));
                "direct"
            }
        };

        lines.push(format!(
            "Invocation::new({:?}, &self.retry).{}(",
            op, call
        ));
        for arg in args {
            lines.push(format!("{},", indent(&arg)));
        }
        lines.push(")".to_string());
        lines.join("\n")
    }

    fn key_closure(&self) -> String {
        let Mode::Connected { key, .. } = self.mode else {
            return String::new();
        };
        let Some(connect) = &self.module.connect else {
            return String::new();
        };
        if connect.params.is_empty() {
            return format!("|_message| Ok({}::new())", key);
        }

        let mut body: Vec<String> = connect
            .params
            .iter()
            .map(|p| {
                format!(
                    "let {name}: {ty} = connect_param(\n    evaluator,\n    {op:?},\n    message,\n    {name:?},\n    self.{name}.as_ref(),\n    manager.{name}.as_ref(),\n)?;",
                    name = p.name,
                    ty = qualified(&p.ty),
                    op = self.op.name,
                )
            })
            .collect();
        let keys = connect
            .key_params()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let extras: String = connect
            .extra_params()
            .map(|p| format!(".with_{0}({0})", p.name))
            .collect();
        body.push(format!("Ok({}::new({}){})", key, keys, extras));
        closure("|message|", &body)
    }

    fn evaluate_closure(&self) -> String {
        let body: Vec<String> = self
            .op
            .params
            .iter()
            .filter_map(|p| self.evaluate_line(p))
            .collect();
        let tuple = tuple(
            self.op
                .params
                .iter()
                .filter(|p| arg_type(p).is_some())
                .map(|p| p.name.clone()),
        );
        if body.is_empty() {
            return format!("|_message| Ok({})", tuple);
        }

        let uses_message = self
            .op
            .params
            .iter()
            .any(|p| p.kind.is_evaluated() || p.kind.is_invokable());
        let head = if uses_message { "|message|" } else { "|_message|" };
        let mut body = body;
        body.push(format!("Ok({})", tuple));
        closure(head, &body)
    }

    fn evaluate_line(&self, p: &Parameter) -> Option<String> {
        let op = &self.op.name;
        let name = &p.name;
        let line = match &p.kind {
            kind if kind.is_evaluated() => format!(
                "let {name} = evaluator.evaluate_as::<{}>({name:?}, message, self.{name}.as_ref())?;",
                value_type(p)
            ),
            ParameterKind::NestedInvokable { many: true } => format!(
                "let {name} = ProcessorRef::bind_all(&self.{name}, message, evaluator);"
            ),
            ParameterKind::NestedInvokable { many: false } | ParameterKind::Callback => {
                let bind = if p.kind == ParameterKind::Callback {
                    "bind_callback"
                } else {
                    "bind"
                };
                if p.optional {
                    format!(
                        "let {name} = self.{name}.as_ref().map(|source| source.{bind}(message, evaluator));"
                    )
                } else {
                    format!(
                        "let {name} = match &self.{name} {{\n    Some(source) => source.{bind}(message, evaluator),\n    None => {{\n        return Err(\n            ProcessError::configuration({op:?}, \"parameter '{name}' is not set\").into(),\n        );\n    }}\n}};"
                    )
                }
            }
            ParameterKind::ConnectionField => {
                format!("let {name} = access_token(module.oauth(), {op:?}, {name:?})?;")
            }
            _ => return None,
        };
        Some(line)
    }

    fn call_closure(&self, receiver: Option<String>, target: &str) -> String {
        let typed: Vec<(String, String)> = self
            .op
            .params
            .iter()
            .filter_map(|p| arg_type(p).map(|ty| (p.name.clone(), ty)))
            .collect();
        let pattern = tuple(typed.iter().map(|(name, _)| name.clone()));
        let types = tuple(typed.iter().map(|(_, ty)| ty.clone()));
        let head = match receiver {
            Some(receiver) => format!("|{}, {}: {}|", receiver, pattern, types),
            None => format!("|{}: {}|", pattern, types),
        };

        let call_args = self
            .op
            .params
            .iter()
            .map(|p| match p.kind {
                ParameterKind::HeaderOut => "&mut outbound".to_string(),
                ParameterKind::SourceCallback => "callback".to_string(),
                _ => p.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut outcome = match self.op.returns {
            Some(_) => ("Ok(value)", "Outcome::returned(value)".to_string()),
            None => ("Ok(())", "Outcome::void()".to_string()),
        };
        if self.op.has_outbound_headers() {
            outcome.1.push_str(".with_outbound(outbound)");
        }
        if let Some(mime) = &self.op.mime_type {
            outcome.1.push_str(&format!(".with_mime_type(Some({:?}))", mime));
        }

        let mut body = Vec::new();
        if self.op.has_outbound_headers() {
            body.push("let mut outbound = OutboundHeaders::new();".to_string());
        }
        let mut arms = vec![format!("    {} => Ok({}),", outcome.0, outcome.1)];
        if let (Some(variant), Some(error)) = (&self.op.invalidate_on, &self.module.error_type) {
            arms.push(format!(
                "    Err(err) if matches!(err, {}::{} {{ .. }}) => Err(InvocationError::invalidating(err)),",
                error, variant
            ));
        }
        arms.push("    Err(err) => Err(InvocationError::failed(err)),".to_string());
        body.push(format!(
            "match {}.{}({}) {{\n{}\n}}",
            target,
            self.op.method,
            call_args,
            arms.join("\n")
        ));
        closure(&head, &body)
    }
}

/// Source field type for a parameter, if it has one.
fn source_type(p: &Parameter) -> Option<&'static str> {
    match p.kind {
        ParameterKind::NestedInvokable { many: true } => Some("Vec<ProcessorRef>"),
        ParameterKind::NestedInvokable { many: false } | ParameterKind::Callback => {
            Some("Option<ProcessorRef>")
        }
        ref kind if kind.is_evaluated() => Some("Option<Value>"),
        _ => None,
    }
}

fn source_init(p: &Parameter) -> Option<String> {
    match source_type(p)? {
        "Vec<ProcessorRef>" => Some("Vec::new()".to_string()),
        "Option<ProcessorRef>" => Some("None".to_string()),
        _ => Some(match (&p.default, p.kind.implied_expression()) {
            (Some(default), _) => format!("Some({})", default.to_value_expr()),
            (None, Some(expression)) => format!("Some(Value::from({:?}))", expression),
            (None, None) => "None".to_string(),
        }),
    }
}

fn source_setter(p: &Parameter) -> Option<Fn> {
    let setter = Fn::new(format!("with_{}", p.name)).receiver(Receiver::OwnedMut);
    let setter = match source_type(p)? {
        "Vec<ProcessorRef>" => setter
            .param(Param::new("processors", "Vec<ProcessorRef>"))
            .body(&format!("self.{} = processors;\nself", p.name)),
        "Option<ProcessorRef>" => setter
            .param(Param::new("processor", "ProcessorRef"))
            .body(&format!("self.{} = Some(processor);\nself", p.name)),
        _ => setter
            .param(Param::new("value", "impl Into<Value>"))
            .body(&format!("self.{} = Some(value.into());\nself", p.name)),
    };
    Some(setter.returns("Self"))
}

/// Rust type of an evaluated parameter.
fn value_type(p: &Parameter) -> String {
    qualified_optional(&p.ty, p.optional)
}

/// Type of the argument handed to the user method, for parameters that
/// are prepared before the call.
fn arg_type(p: &Parameter) -> Option<String> {
    let ty = match &p.kind {
        ParameterKind::HeaderOut | ParameterKind::SourceCallback => return None,
        ParameterKind::ConnectionField => "String".to_string(),
        ParameterKind::NestedInvokable { many: true } => "Vec<Box<dyn NestedProcessor>>".to_string(),
        ParameterKind::NestedInvokable { many: false } if p.optional => {
            "Option<Box<dyn NestedProcessor>>".to_string()
        }
        ParameterKind::NestedInvokable { many: false } => "Box<dyn NestedProcessor>".to_string(),
        ParameterKind::Callback if p.optional => "Option<Callback>".to_string(),
        ParameterKind::Callback => "Callback".to_string(),
        _ => value_type(p),
    };
    Some(ty)
}

fn tuple(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    match items.len() {
        0 => "()".to_string(),
        1 => format!("({},)", items[0]),
        _ => format!("({})", items.join(", ")),
    }
}

fn closure(head: &str, body: &[String]) -> String {
    let body: Vec<String> = body.iter().map(|line| indent(line)).collect();
    format!("{} {{\n{}\n}}", head, body.join("\n"))
}

/// Indent every non-empty line by one level.
fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use connkit_ir::{DefaultValue, OAuthDecl, TypeRef};

    use super::*;
    use crate::{generators::fixtures, lints::fixtures as modules};

    fn get_account() -> Operation {
        let mut op = modules::operation("get-account");
        op.returns = Some(TypeRef::parse("String").unwrap());
        op.params.push(modules::param("id", ParameterKind::Plain));
        op
    }

    #[test]
    fn test_direct_processor() {
        let mut module = modules::module();
        module.operations.push(get_account());

        let code = fixtures::unit(module, "crm/get_account_processor.rs");
        assert!(code.contains("pub struct GetAccountProcessor {"));
        assert!(code.contains("    config: ConfigRef<crate::Crm>,\n"));
        assert!(code.contains("retry: RetryState::new(1),"));
        assert!(code.contains("pub fn with_id(mut self, value: impl Into<Value>) -> Self {"));
        assert!(code.contains("let target = &*module;"));
        assert!(code.contains("Invocation::new(\"get-account\", &self.retry).direct("));
        assert!(code.contains(
            "let id = evaluator.evaluate_as::<String>(\"id\", message, self.id.as_ref())?;"
        ));
        assert!(code.contains("|(id,): (String,)| {"));
        assert!(code.contains("match target.get_account(id) {"));
        assert!(code.contains("Ok(value) => Ok(Outcome::returned(value)),"));
        assert!(!code.contains("invalidating"));
    }

    #[test]
    fn test_process_body_layout() {
        let mut module = modules::module();
        let mut op = modules::operation("ping");
        op.mime_type = Some("text/plain".into());
        module.operations.push(op);

        let emitter = ProcessorEmitter {
            module: &module,
            op: &module.operations[0],
            outer: "crate::Crm",
            mode: &Mode::Direct {
                user_path: String::new(),
            },
        };
        insta::assert_snapshot!(emitter.process_body(), @r#"
        let module = self.config.resolve(&self.context.registry, "ping")?;
        let target = &*module;
        Invocation::new("ping", &self.retry).direct(
            message,
            |_message| Ok(()),
            |(): ()| {
                match target.ping() {
                    Ok(()) => Ok(Outcome::void().with_mime_type(Some("text/plain"))),
                    Err(err) => Err(InvocationError::failed(err)),
                }
            },
        )
        "#);
    }

    #[test]
    fn test_connected_processor() {
        let mut module = modules::module();
        module.connect = Some(modules::connect());
        let mut op = get_account();
        op.invalidate_on = Some("SessionExpired".into());
        op.retry_max = 3;
        module.operations.push(op);

        let code = fixtures::unit(module, "crm/get_account_processor.rs");
        assert!(code.contains("retry: RetryState::new(3),"));
        assert!(code.contains("pub fn with_user(mut self, value: impl Into<Value>) -> Self {"));
        assert!(code.contains("let manager = &module;"));
        assert!(code.contains(".connected(\n            manager.connection_manager(),"));
        assert!(code.contains("let user: String = connect_param("));
        assert!(code.contains("manager.user.as_ref(),"));
        assert!(code.contains("Ok(CrmConnectionKey::new(user))"));
        assert!(code.contains("|connection: &mut crate::Crm, (id,): (String,)| {"));
        assert!(code.contains(
            "Err(err) if matches!(err, crate::CrmError::SessionExpired { .. }) => Err(InvocationError::invalidating(err)),"
        ));
    }

    #[test]
    fn test_pooled_processor_with_lifecycle() {
        let mut module = modules::module();
        module.poolable = true;
        module.lifecycle.start = Some("start".into());
        module.operations.push(get_account());

        let code = fixtures::unit(module, "crm/get_account_processor.rs");
        assert!(code.contains("config: ConfigRef<CrmPoolAdapter>,"));
        assert!(code.contains("module.pool(),"));
        assert!(code.contains("|instance: &mut CrmLifecycleAdapter, (id,): (String,)| {"));
        assert!(code.contains("match instance.inner.get_account(id) {"));
    }

    #[test]
    fn test_parameter_kinds() {
        let mut module = modules::module();
        module.oauth = Some(OAuthDecl {
            authorization_url: "https://a".into(),
            access_token_url: "https://t".into(),
            scope: None,
            callback_path: None,
        });
        let mut op = modules::operation("sync");
        let mut limit = modules::param("limit", ParameterKind::Plain);
        limit.ty = TypeRef::parse("i64").unwrap();
        limit.default = Some(DefaultValue::Int(50));
        op.params = vec![
            limit,
            modules::param("body", ParameterKind::Payload),
            modules::param("steps", ParameterKind::NestedInvokable { many: true }),
            modules::param("on_done", ParameterKind::Callback),
            modules::param("headers", ParameterKind::HeaderOut),
            modules::param("token", ParameterKind::ConnectionField),
        ];
        module.operations.push(op);

        let code = fixtures::unit(module, "crm/sync_processor.rs");
        assert!(code.contains("limit: Some(Value::Int(50)),"));
        assert!(code.contains("body: Some(Value::from(\"#[payload]\")),"));
        assert!(code.contains("steps: Vec::new(),"));
        assert!(code.contains("let steps = ProcessorRef::bind_all(&self.steps, message, evaluator);"));
        assert!(code.contains("Some(source) => source.bind_callback(message, evaluator),"));
        assert!(code.contains("let target = &module.inner;"));
        assert!(code.contains("let token = access_token(module.oauth(), \"sync\", \"token\")?;"));
        assert!(code.contains("let mut outbound = OutboundHeaders::new();"));
        assert!(code.contains(
            "match target.sync(limit, body, steps, on_done, &mut outbound, token) {"
        ));
        assert!(code.contains("Ok(()) => Ok(Outcome::void().with_outbound(outbound)),"));
        assert!(code.contains(
            "(limit, body, steps, on_done, token): (i64, String, Vec<Box<dyn NestedProcessor>>, Callback, String)"
        ));
    }

    #[test]
    fn test_map_parameters_use_full_paths() {
        let mut module = modules::module();
        let mut op = modules::operation("tag");
        let mut labels = modules::param("labels", ParameterKind::Plain);
        labels.ty = TypeRef::parse("HashMap<String, i64>").unwrap();
        let mut order = modules::param("order", ParameterKind::Plain);
        order.ty = TypeRef::parse("IndexMap<String, bool>").unwrap();
        op.params = vec![labels, order];
        module.operations.push(op);

        let code = fixtures::unit(module, "crm/tag_processor.rs");
        assert!(code.contains(
            "evaluator.evaluate_as::<std::collections::HashMap<String, i64>>(\"labels\""
        ));
        assert!(code.contains(
            "evaluator.evaluate_as::<connkit_runtime::IndexMap<String, bool>>(\"order\""
        ));
        assert!(!code.contains("<HashMap<"));
    }

    #[test]
    fn test_no_processors_without_operations() {
        let ctx = fixtures::run(modules::module());
        assert!(ctx.units.names().all(|name| !name.ends_with("_processor.rs")));
    }
}
