use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::artifact::Artifact;
use crate::cancel::{CancelToken, Cancelled};
use crate::compiler::CompilerService;
use crate::config::{LiveDrawConfig, SurfaceConfiguration};
use crate::diagnostic::{CompilationOutcome, Diagnostic};
use crate::foundation::core::Canvas;
use crate::foundation::error::{LiveDrawError, LiveDrawResult};
use crate::pipeline::event::PipelineEvent;
use crate::pipeline::state::{ControllerStats, PipelineSnapshot, PipelineState};
use crate::render::{RenderedImage, SurfaceAdapter, SurfaceKind};

/// A compile task reporting back.
struct Completion {
    generation: u64,
    result: Result<CompilationOutcome, Cancelled>,
}

/// The compile the controller is currently waiting for.
struct InFlight {
    generation: u64,
    token: CancelToken,
}

/// Owns the current inputs, the last good artifact and the published images.
///
/// All state changes happen on `&mut self`, so the controller is the single writer. Compiles
/// run as Tokio tasks and report back through a channel tagged with the generation that
/// started them; only a completion whose generation is still current is applied.
///
/// Rendering is synchronous and runs on the caller's task.
pub struct PipelineController {
    compiler: Arc<dyn CompilerService>,
    surfaces: Vec<Box<dyn SurfaceAdapter>>,
    configurations: Vec<SurfaceConfiguration>,
    selected: usize,
    canvas: Canvas,
    source: Option<String>,

    runtime: tokio::runtime::Handle,
    generation: u64,
    in_flight: Option<InFlight>,
    /// Spawned compile tasks whose completion has not been received yet, stale ones included.
    outstanding: usize,
    completions_tx: async_channel::Sender<Completion>,
    completions_rx: async_channel::Receiver<Completion>,

    state: PipelineState,
    last_good: Option<Arc<dyn Artifact>>,
    compile_diagnostics: Vec<Diagnostic>,
    render_diagnostics: Vec<Diagnostic>,
    diagnostics: Vec<Diagnostic>,
    images: BTreeMap<SurfaceKind, Arc<RenderedImage>>,

    stats: ControllerStats,
    revision: u64,
    snapshots: watch::Sender<PipelineSnapshot>,
}

impl PipelineController {
    /// Build a controller. Must be called inside a Tokio runtime.
    ///
    /// `surfaces` are rendered in the given order and must not repeat a kind.
    pub fn new(
        compiler: Arc<dyn CompilerService>,
        surfaces: Vec<Box<dyn SurfaceAdapter>>,
        config: &LiveDrawConfig,
    ) -> LiveDrawResult<Self> {
        config.validate()?;
        let canvas = config.canvas()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            LiveDrawError::runtime(format!("pipeline controller needs a Tokio runtime: {e}"))
        })?;

        for (i, s) in surfaces.iter().enumerate() {
            if surfaces[..i].iter().any(|o| o.kind() == s.kind()) {
                return Err(LiveDrawError::validation(format!(
                    "surface kind '{}' registered more than once",
                    s.kind()
                )));
            }
        }

        let (completions_tx, completions_rx) = async_channel::unbounded();
        let configurations = config.configurations.clone();
        let selected = config.selected_configuration;
        let (snapshots, _) = watch::channel(PipelineSnapshot {
            canvas,
            configuration: configurations[selected].label.clone(),
            ..PipelineSnapshot::default()
        });

        Ok(Self {
            compiler,
            surfaces,
            configurations,
            selected,
            canvas,
            source: None,
            runtime,
            generation: 0,
            in_flight: None,
            outstanding: 0,
            completions_tx,
            completions_rx,
            state: PipelineState::Ready,
            last_good: None,
            compile_diagnostics: Vec::new(),
            render_diagnostics: Vec::new(),
            diagnostics: Vec::new(),
            images: BTreeMap::new(),
            stats: ControllerStats::default(),
            revision: 0,
            snapshots,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Published diagnostics: compile diagnostics, then render diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn image(&self, kind: SurfaceKind) -> Option<Arc<RenderedImage>> {
        self.images.get(&kind).cloned()
    }

    pub fn images(&self) -> &BTreeMap<SurfaceKind, Arc<RenderedImage>> {
        &self.images
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn configurations(&self) -> &[SurfaceConfiguration] {
        &self.configurations
    }

    pub fn selected_configuration(&self) -> usize {
        self.selected
    }

    /// `true` while the authoritative compile has not reported back.
    pub fn is_compiling(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Watch the published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshots.subscribe()
    }

    /// Apply one input change.
    pub fn handle_event(&mut self, event: PipelineEvent) -> LiveDrawResult<()> {
        match event {
            PipelineEvent::SourceChanged(source) => {
                self.set_source(source);
                Ok(())
            }
            PipelineEvent::WidthChanged(width) => self.set_size(width, self.canvas.height),
            PipelineEvent::HeightChanged(height) => self.set_size(self.canvas.width, height),
            PipelineEvent::SizeChanged { width, height } => self.set_size(width, height),
            PipelineEvent::ConfigurationChanged(index) => self.select_configuration(index),
        }
    }

    /// Replace the source and start compiling it. The previous compile, if any, is cancelled.
    pub fn set_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        if self.source.as_deref() == Some(source.as_str()) {
            return;
        }

        if let Some(prev) = self.in_flight.take() {
            prev.token.cancel();
            tracing::debug!(generation = prev.generation, "cancelled superseded compile");
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancelToken::new();
        let signal = token.signal();
        self.in_flight = Some(InFlight { generation, token });
        self.outstanding += 1;
        self.stats.compiles_started += 1;
        self.source = Some(source.clone());
        self.state = PipelineState::Working;

        let compiler = Arc::clone(&self.compiler);
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            // An inner task so a panicking compiler still reports back.
            let task = tokio::spawn(async move { compiler.compile(source, signal).await });
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Ok(CompilationOutcome::internal_failure(format!(
                    "internal compiler error: {e}"
                ))),
            };
            if tx.send(Completion { generation, result }).await.is_err() {
                tracing::trace!(generation, "controller gone; completion dropped");
            }
        });
        tracing::debug!(generation, "compile started");

        self.publish();
    }

    /// Resize every surface. Re-renders the last good artifact without recompiling.
    pub fn set_size(&mut self, width: u32, height: u32) -> LiveDrawResult<()> {
        let canvas = Canvas::new(width, height)?;
        if canvas == self.canvas {
            return Ok(());
        }
        self.canvas = canvas;
        self.refresh();
        Ok(())
    }

    /// Switch the output configuration. Re-renders the last good artifact without recompiling.
    pub fn select_configuration(&mut self, index: usize) -> LiveDrawResult<()> {
        if index >= self.configurations.len() {
            return Err(LiveDrawError::validation(format!(
                "configuration index {index} is out of range (0..{})",
                self.configurations.len()
            )));
        }
        if index == self.selected {
            return Ok(());
        }
        self.selected = index;
        self.refresh();
        Ok(())
    }

    /// Wait for and apply one compile completion, stale or not.
    ///
    /// Returns `false` without waiting when no compile task is outstanding.
    pub async fn process_next_completion(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Ok(completion) => {
                self.on_completion(completion);
                true
            }
            Err(_) => false,
        }
    }

    /// Process completions until the authoritative compile has been applied.
    pub async fn settle(&mut self) {
        while self.in_flight.is_some() {
            if !self.process_next_completion().await {
                break;
            }
        }
    }

    /// Drive the controller from an event channel until it closes, then settle.
    pub async fn run(&mut self, events: async_channel::Receiver<PipelineEvent>) {
        let completions = self.completions_rx.clone();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Err(e) = self.handle_event(event) {
                            tracing::warn!(error = %e, "pipeline event rejected");
                        }
                    }
                    Err(_) => break,
                },
                Ok(completion) = completions.recv(), if self.outstanding > 0 => {
                    self.on_completion(completion);
                }
            }
        }
        self.settle().await;
    }

    fn on_completion(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let Completion { generation, result } = completion;

        let current = self.in_flight.as_ref().map(|f| f.generation);
        match generation.cmp(&self.generation) {
            Ordering::Greater => {
                debug_assert!(
                    false,
                    "completion for generation {generation} is newer than current {}",
                    self.generation
                );
                tracing::error!(
                    generation,
                    current = self.generation,
                    "completion from the future; dropped"
                );
                self.stats.compiles_discarded += 1;
                return;
            }
            Ordering::Less => {
                tracing::trace!(generation, current = self.generation, "stale completion dropped");
                self.stats.compiles_discarded += 1;
                return;
            }
            Ordering::Equal if current != Some(generation) => {
                tracing::trace!(generation, "duplicate completion dropped");
                self.stats.compiles_discarded += 1;
                return;
            }
            Ordering::Equal => {}
        }
        self.in_flight = None;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(Cancelled) => {
                // Only a compiler giving up on its own lands here; nothing replaces this compile.
                tracing::debug!(generation, "current compile reported cancellation");
                self.stats.compiles_discarded += 1;
                self.state = if self.compile_diagnostics.iter().any(Diagnostic::is_error) {
                    PipelineState::Error
                } else {
                    PipelineState::Ready
                };
                self.publish();
                return;
            }
        };

        self.stats.compiles_committed += 1;
        self.compile_diagnostics = outcome.diagnostics().to_vec();
        tracing::debug!(
            generation,
            has_errors = outcome.has_errors(),
            diagnostics = self.compile_diagnostics.len(),
            "compile committed"
        );

        if outcome.has_errors() {
            // Keep the last good artifact and its images.
            self.state = PipelineState::Error;
            self.render_diagnostics.clear();
            self.publish();
            return;
        }

        self.state = PipelineState::Ready;
        match outcome.artifact() {
            Some(artifact) => {
                self.last_good = Some(Arc::clone(artifact));
                self.refresh();
            }
            None => {
                self.render_diagnostics.clear();
                self.publish();
            }
        }
    }

    /// Render the last good artifact (if any), publish, then release superseded images.
    ///
    /// While the current source fails to compile, the render diagnostics come from the last
    /// good artifact and are published after the current source's compile errors.
    fn refresh(&mut self) {
        let retired = match self.last_good.clone() {
            Some(artifact) => self.render_tick(artifact.as_ref()),
            None => Vec::new(),
        };
        self.publish();
        for image in retired {
            tracing::trace!(
                surface = %image.kind(),
                width = image.descriptor().width,
                height = image.descriptor().height,
                "image released"
            );
            drop(image);
            self.stats.images_released += 1;
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(
            width = self.canvas.width,
            height = self.canvas.height,
            configuration = %self.configurations[self.selected].label,
        )
    )]
    fn render_tick(&mut self, artifact: &dyn Artifact) -> Vec<Arc<RenderedImage>> {
        let descriptor = self.configurations[self.selected].descriptor(self.canvas);
        let mut diagnostics = Vec::new();
        let mut retired = Vec::new();

        for surface in &mut self.surfaces {
            let out = surface.execute(artifact, &descriptor);
            diagnostics.extend(out.diagnostics);
            if let Some(image) = out.image
                && let Some(old) = self.images.insert(surface.kind(), Arc::new(image))
            {
                retired.push(old);
            }
        }

        self.stats.render_ticks += 1;
        tracing::debug!(diagnostics = diagnostics.len(), "render tick finished");
        self.render_diagnostics = diagnostics;
        retired
    }

    fn publish(&mut self) {
        self.diagnostics = self
            .compile_diagnostics
            .iter()
            .chain(&self.render_diagnostics)
            .cloned()
            .collect();
        self.revision += 1;
        self.snapshots.send_replace(PipelineSnapshot {
            revision: self.revision,
            state: self.state,
            diagnostics: self.diagnostics.clone(),
            images: self.images.clone(),
            canvas: self.canvas,
            configuration: self.configurations[self.selected].label.clone(),
        });
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        if let Some(f) = self.in_flight.take() {
            f.token.cancel();
        }
    }
}

impl std::fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("state", &self.state)
            .field("canvas", &self.canvas)
            .field("selected", &self.selected)
            .field("generation", &self.generation)
            .field("compiling", &self.in_flight.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
