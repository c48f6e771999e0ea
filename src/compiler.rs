//! Turning sketch source into a runnable [`Artifact`].
//!
//! A compile either finishes with a [`CompilationOutcome`] or stops early with
//! [`Cancelled`]. There is no partial outcome.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, DrawTarget, ExecutionFault};
use crate::cancel::{CancelSignal, Cancelled};
use crate::diagnostic::{CompilationOutcome, Diagnostic, LineIndex};
use crate::script::bytecode::BytecodeProgram;
use crate::script::codegen::compile_script;
use crate::script::vm;

pub use crate::script::vm::ExecLimits;

/// Anything that can compile source text into an artifact.
#[async_trait]
pub trait CompilerService: Send + Sync {
    /// Compile `source`. Returns `Err(Cancelled)` when `cancel` fired before the work finished.
    async fn compile(
        &self,
        source: String,
        cancel: CancelSignal,
    ) -> Result<CompilationOutcome, Cancelled>;
}

/// Compiler for the built-in sketch language.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptCompiler {
    limits: ExecLimits,
}

impl ScriptCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts produced by this compiler run under `limits`.
    pub fn with_limits(limits: ExecLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ExecLimits {
        self.limits
    }

    /// Synchronous compile on the calling thread.
    pub fn compile_blocking(
        &self,
        source: &str,
        cancel: &CancelSignal,
    ) -> Result<CompilationOutcome, Cancelled> {
        let compiled = compile_script(source, cancel)?;
        let lines = Arc::new(LineIndex::new(source));

        let diagnostics: Vec<Diagnostic> = compiled
            .messages
            .into_iter()
            .map(|m| Diagnostic::new(m.severity, Some(lines.location(m.span)), m.message))
            .collect();

        let artifact = compiled.program.map(|program| {
            Arc::new(ScriptArtifact {
                program: Arc::new(program),
                lines: Arc::clone(&lines),
                limits: self.limits,
            }) as Arc<dyn Artifact>
        });

        Ok(CompilationOutcome::new(artifact, diagnostics))
    }
}

#[async_trait]
impl CompilerService for ScriptCompiler {
    async fn compile(
        &self,
        source: String,
        cancel: CancelSignal,
    ) -> Result<CompilationOutcome, Cancelled> {
        let this = *self;
        match tokio::task::spawn_blocking(move || this.compile_blocking(&source, &cancel)).await {
            Ok(res) => res,
            Err(err) => Ok(CompilationOutcome::internal_failure(format!(
                "internal compiler error: {err}"
            ))),
        }
    }
}

/// A compiled sketch: bytecode plus what is needed to locate runtime faults.
#[derive(Debug)]
pub struct ScriptArtifact {
    program: Arc<BytecodeProgram>,
    lines: Arc<LineIndex>,
    limits: ExecLimits,
}

impl Artifact for ScriptArtifact {
    fn draw(&self, target: &mut dyn DrawTarget) -> Result<(), ExecutionFault> {
        vm::run(&self.program, target, self.limits).map_err(|fault| {
            let location = self
                .program
                .spans
                .get(fault.op)
                .map(|span| self.lines.location(*span));
            ExecutionFault::new(fault.message).at(location)
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/compiler.rs"]
mod tests;
