//! One message source per declared source.
//!
//! A source reaches the user type the same way an operation processor does
//! and reuses its invocation body. The body runs on a `SourceRunner` thread
//! and hands the user method a `SourceCallback` instead of returning a
//! result.

use connkit_ir::{ModuleDescriptor, Operation};
use tracing::debug;

use super::processor::{Mode, ProcessorEmitter, resolve_mode};
use crate::{
    ast::{Field, Fn, Impl, Param, Receiver, Struct},
    pipeline::{GenerationContext, GenerationError, Generator},
    roles::Role,
    unit::{UnitWriter, unit_name},
};

pub struct SourceGenerator;

impl Generator for SourceGenerator {
    fn name(&self) -> &'static str {
        "message-sources"
    }

    fn requires(&self) -> &[Role] {
        &[Role::ModuleObject, Role::ConnectorObject]
    }

    fn reads(&self) -> &[Role] {
        &[Role::ConnectionManager, Role::ConnectionKey, Role::PoolObject]
    }

    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        !module.sources.is_empty()
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError> {
        let (outer, mode) = resolve_mode(ctx, module)?;

        for source in &module.sources {
            let file = format!("{}_source", connkit_core::to_snake_case(&source.name));
            debug!(source = %source.name, unit = %unit_name(&module.name, &file), "emitting source");

            let op = source.as_operation();
            let unit = emit(module, &op, &outer, &mode).finish(&module.name, self.name(), &file);
            ctx.emit(unit);
        }
        Ok(())
    }
}

fn emit(module: &ModuleDescriptor, op: &Operation, outer: &str, mode: &Mode) -> UnitWriter {
    let emitter = ProcessorEmitter {
        module,
        op,
        outer,
        mode,
    };
    let name = format!("{}Source", connkit_core::to_pascal_case(&op.name));

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
        "SourceCallback",
        "SourceRunner",
    ]);
    emitter.imports(&mut writer);

    let definition = Struct::new(&name)
        .fields(emitter.fields())
        .field(Field::new("runner", "SourceRunner").private());
    writer.item(&match &op.description {
        Some(description) => definition.doc(description.clone()),
        None => definition.doc(format!("Runs the `{}` message source.", op.name)),
    });

    let run_body = format!(
        "let message = Message::empty();\n{}.map(|_| ())",
        emitter.process_body()
    );
    writer.item(
        &Impl::new(&name)
            .method(emitter.new_fn(&[format!("    runner: SourceRunner::new({:?}),", op.name)]))
            .methods(emitter.setters())
            .method(
                Fn::new("runner")
                    .receiver(Receiver::Ref)
                    .returns("&SourceRunner")
                    .body_line("&self.runner"),
            )
            .method(
                Fn::new("start")
                    .doc("Run the source on its own thread, sending every message it produces through `listener`.")
                    .receiver(Receiver::Arc)
                    .param(Param::new("listener", "Arc<dyn MessageProcessor>"))
                    .returns("Result<(), ProcessError>")
                    .body("let source = Arc::clone(self);\nself.runner.start(listener, move |callback| source.run(callback))"),
            )
            .method(
                Fn::new("stop")
                    .doc("Ask the source to stop and wait for its thread.")
                    .receiver(Receiver::Ref)
                    .body_line("self.runner.stop();"),
            )
            .method(
                Fn::new("run")
                    .private()
                    .receiver(Receiver::Ref)
                    .param(Param::new("callback", "&SourceCallback"))
                    .returns("Result<(), ProcessError>")
                    .body(&run_body),
            ),
    );
    writer
}
