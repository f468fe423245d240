//! Generator pipeline.
//!
//! A [`Pipeline`] holds generators, lints and plugins. Generators declare
//! which roles they require and provide; [`Pipeline::schedule`] turns those
//! declarations into a fixed run order once, before any module is processed.
//!
//! # Example
//!
//! ```ignore
//! let ctx = Pipeline::new()
//!     .generator(DocsGenerator)
//!     .plugin(TimingPlugin::default())
//!     .run(&modules)?;
//!
//! for unit in ctx.units.iter() {
//!     println!("{}", unit.name);
//! }
//! ```

mod context;
mod diagnostic;
mod error;
mod generator;
mod plugin;
mod schedule;

pub use context::GenerationContext;
use connkit_ir::ModuleDescriptor;
pub use diagnostic::{Diagnostic, Severity};
pub use error::{GenerationError, ScheduleError};
use eyre::{Result, WrapErr};
pub use generator::Generator;
pub use plugin::Plugin;
pub use schedule::schedule;
use tracing::debug;

use crate::{
    generators,
    lints::{Lint, default_lints},
    roles::{Role, TypeHandle},
};

/// Roles every module starts with. `ModuleObject` is the user type.
const SEEDS: &[Role] = &[Role::ModuleObject];

/// Runs generators over module descriptors in dependency order.
pub struct Pipeline {
    generators: Vec<Box<dyn Generator>>,
    lints: Vec<Box<dyn Lint>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    /// A pipeline with the core generators and the built-in lints.
    pub fn new() -> Self {
        Self {
            generators: generators::core(),
            lints: default_lints(),
            plugins: Vec::new(),
        }
    }

    /// A pipeline with no generators, lints or plugins.
    pub fn empty() -> Self {
        Self {
            generators: Vec::new(),
            lints: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Append a generator. Its position in the run follows from its roles.
    pub fn generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn lint(mut self, lint: impl Lint + 'static) -> Self {
        self.lints.push(Box::new(lint));
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Generator names in insertion order.
    pub fn generator_names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Generators in the order they will run.
    pub fn schedule(&self) -> Result<Vec<&dyn Generator>, ScheduleError> {
        let order = schedule(&self.generators, SEEDS)?;
        Ok(order.into_iter().map(|i| self.generators[i].as_ref()).collect())
    }

    /// Run every lint over `module`.
    pub fn check(&self, module: &ModuleDescriptor) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for lint in &self.lints {
            lint.check(module, &mut diagnostics);
        }
        diagnostics
    }

    /// Generate every module. Stops at the first module with lint errors.
    pub fn run(&self, modules: &[ModuleDescriptor]) -> Result<GenerationContext> {
        let order = self.schedule()?;
        let mut ctx = GenerationContext::new();

        for module in modules {
            ctx.register(
                &module.name,
                Role::ModuleObject,
                TypeHandle::user(&module.type_path),
            );

            let diagnostics = self.check(module);
            let errors = diagnostics.iter().filter(|d| d.severity.is_error()).count();
            ctx.diagnostics.extend(diagnostics);
            if errors > 0 {
                return Err(GenerationError::Lint {
                    module: module.name.clone(),
                    count: errors,
                }
                .into());
            }

            for generator in &order {
                self.run_generator(*generator, module, &mut ctx)?;
            }

            let index = ctx.units.index(&module.name);
            ctx.emit(index);
        }

        Ok(ctx)
    }

    fn run_generator(
        &self,
        generator: &dyn Generator,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<()> {
        let name = generator.name();
        if !generator.should_generate(module) {
            debug!(generator = name, module = %module.name, "skipping generator");
            return Ok(());
        }

        for plugin in &self.plugins {
            plugin
                .on_before_generator(name, module, ctx)
                .wrap_err_with(|| format!("plugin '{}' failed before '{}'", plugin.name(), name))?;
        }

        debug!(generator = name, module = %module.name, "running generator");
        generator
            .generate(module, ctx)
            .wrap_err_with(|| format!("generator '{}' failed for module '{}'", name, module.name))?;

        for plugin in &self.plugins {
            plugin
                .on_after_generator(name, module, ctx)
                .wrap_err_with(|| format!("plugin '{}' failed after '{}'", plugin.name(), name))?;
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
