//! Run manager: lifecycle, user initializations and event processing.
//!
//! The run manager owns the three user initializations, the seeded random
//! engine and the command interpreter. Events are processed on the calling
//! thread by the sequential model and on scoped worker threads, each with an
//! engine forked from the master, by the multi-threaded model.

use crate::config::{DEFAULT_WORKER_THREADS, RunManagerKind};
use crate::errors::{CommandError, SimError, SimResult};
use crate::interfaces::{CommandInterpreter, Messenger, RunController};
use crate::kernel::policies::{
    ActionInitialization, DetectorConstruction, DetectorGeometry, ParticleProcesses, PhysicsList,
};
use crate::kernel::ui_manager::UiManager;
use crate::random::RandomEngine;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Lifecycle of the run manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built, user initializations incomplete
    Constructed,
    /// All three user initializations registered
    Configured,
    /// Geometry and physics built; ready for runs
    Initialized,
    /// A run is being processed
    Running,
    /// Released
    Terminated,
}

/// How events are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionModel {
    /// All events on the calling thread
    Sequential,
    /// Events distributed round-robin over worker threads
    MultiThreaded {
        /// Number of workers
        threads: u16,
    },
}

impl From<RunManagerKind> for ExecutionModel {
    fn from(kind: RunManagerKind) -> Self {
        match kind {
            RunManagerKind::Serial => Self::Sequential,
            RunManagerKind::MultiThreaded => Self::MultiThreaded {
                threads: DEFAULT_WORKER_THREADS,
            },
        }
    }
}

/// Outcome of one `beamOn`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sequential run number
    pub run_id: u32,
    /// Events processed
    pub events: u64,
    /// Primaries that reached the sensor
    pub hits: u64,
    /// Primaries that missed the sensor
    pub escaped: u64,
    /// Hit count per `(column, row)` pixel
    pub pixel_counts: HashMap<(u32, u32), u64>,
}

impl RunSummary {
    fn merge(&mut self, other: Self) {
        self.events += other.events;
        self.hits += other.hits;
        self.escaped += other.escaped;
        for (pixel, count) in other.pixel_counts {
            *self.pixel_counts.entry(pixel).or_default() += count;
        }
    }

    /// Pixel with the most hits, ties broken by lowest coordinates.
    #[must_use]
    pub fn hottest_pixel(&self) -> Option<((u32, u32), u64)> {
        self.pixel_counts
            .iter()
            .map(|(&pixel, &count)| (pixel, count))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }
}

/// Straight-line transport of each primary onto the sensor front face.
fn process_events(
    actions: &dyn ActionInitialization,
    worker: usize,
    events: u64,
    geometry: &DetectorGeometry,
    physics: &[ParticleProcesses],
    engine: &mut RandomEngine,
) -> SimResult<RunSummary> {
    let mut user_actions = actions.build(worker);
    let sensor = &geometry.sensor;
    let mut summary = RunSummary::default();

    for _ in 0..events {
        let primary = user_actions.primary_generator.generate_primaries(engine);
        if !physics.iter().any(|entry| entry.particle == primary.particle) {
            return Err(SimError::UnknownParticle(primary.particle));
        }
        summary.events += 1;

        let [x, y, z] = primary.position_mm;
        let [dx, dy, dz] = primary.direction;
        let path_length = (sensor.front_z_mm - z) / dz;
        let pixel = (dz != 0.0 && path_length >= 0.0)
            .then(|| sensor.pixel_at(path_length.mul_add(dx, x), path_length.mul_add(dy, y)))
            .flatten();
        match pixel {
            Some(pixel) => {
                summary.hits += 1;
                *summary.pixel_counts.entry(pixel).or_default() += 1;
            }
            None => summary.escaped += 1,
        }
    }

    log::debug!("Worker {worker} processed {events} events");
    Ok(summary)
}

/// Events assigned to `worker` when `total` events go round-robin over `workers`.
fn events_for_worker(total: u64, workers: u64, worker: u64) -> u64 {
    total / workers + u64::from(worker < total % workers)
}

/// Kernel state driven by `/run/` commands and the bootstrap.
pub struct RunKernel {
    model: ExecutionModel,
    state: RunState,
    engine: RandomEngine,
    detector: Option<Box<dyn DetectorConstruction>>,
    physics: Option<Box<dyn PhysicsList>>,
    actions: Option<Box<dyn ActionInitialization>>,
    geometry: Option<DetectorGeometry>,
    physics_table: Vec<ParticleProcesses>,
    next_run_id: u32,
    last_summary: Option<RunSummary>,
    run_verbose: u8,
    event_verbose: u8,
    tracking_verbose: u8,
}

impl RunKernel {
    /// Creates a kernel for `kind` around a seeded engine.
    #[must_use]
    pub fn new(kind: RunManagerKind, engine: RandomEngine) -> Self {
        Self {
            model: kind.into(),
            state: RunState::Constructed,
            engine,
            detector: None,
            physics: None,
            actions: None,
            geometry: None,
            physics_table: Vec::new(),
            next_run_id: 0,
            last_summary: None,
            run_verbose: 0,
            event_verbose: 0,
            tracking_verbose: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Scheduling model in effect.
    #[must_use]
    pub const fn execution_model(&self) -> ExecutionModel {
        self.model
    }

    /// Geometry built by the last initialization.
    #[must_use]
    pub const fn geometry(&self) -> Option<&DetectorGeometry> {
        self.geometry.as_ref()
    }

    /// Summary of the most recent run.
    #[must_use]
    pub const fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    fn worker_threads(&self) -> Option<u16> {
        match self.model {
            ExecutionModel::Sequential => None,
            ExecutionModel::MultiThreaded { threads } => Some(threads),
        }
    }

    fn set_worker_threads(&mut self, threads: u16) {
        match &mut self.model {
            ExecutionModel::Sequential => {
                log::debug!("Sequential run manager ignores the worker count ({threads})");
            }
            ExecutionModel::MultiThreaded { threads: current } => *current = threads.max(1),
        }
    }

    fn update_configured(&mut self) {
        if self.state == RunState::Constructed
            && self.detector.is_some()
            && self.physics.is_some()
            && self.actions.is_some()
        {
            self.state = RunState::Configured;
        }
    }

    fn initialize(&mut self) -> SimResult<()> {
        match self.state {
            RunState::Initialized => {
                log::debug!("Run manager already initialized");
                return Ok(());
            }
            RunState::Running | RunState::Terminated => {
                return Err(SimError::InvalidState {
                    action: "initialize",
                    state: self.state,
                });
            }
            RunState::Constructed | RunState::Configured => {}
        }

        let detector = self
            .detector
            .as_ref()
            .ok_or(SimError::MissingInitialization("detector construction"))?;
        let physics = self
            .physics
            .as_ref()
            .ok_or(SimError::MissingInitialization("physics list"))?;
        let actions = self
            .actions
            .as_ref()
            .ok_or(SimError::MissingInitialization("action initialization"))?;

        let geometry = detector.construct()?;
        geometry.validate()?;
        let physics_table = physics.construct_processes();
        actions.build_for_master();

        log::info!(
            "Geometry: {}x{} pixels of {} mm {} sensor, {} mm thick",
            geometry.sensor.columns,
            geometry.sensor.rows,
            geometry.sensor.pitch_mm,
            geometry.sensor.material,
            geometry.sensor.thickness_mm
        );
        log::info!(
            "Physics: {} particles, production cut {} mm",
            physics_table.len(),
            physics.default_cut_mm()
        );

        self.geometry = Some(geometry);
        self.physics_table = physics_table;
        self.state = RunState::Initialized;
        Ok(())
    }

    /// Processes `events` events.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] unless initialized, and event
    /// processing failures of any worker.
    pub fn beam_on(&mut self, events: u64) -> SimResult<RunSummary> {
        if self.state != RunState::Initialized {
            return Err(SimError::InvalidState {
                action: "beamOn",
                state: self.state,
            });
        }
        let (Some(actions), Some(geometry)) = (self.actions.as_deref(), self.geometry.as_ref())
        else {
            return Err(SimError::MissingInitialization("action initialization"));
        };

        let run_id = self.next_run_id;
        let tag = uuid::Uuid::new_v4();
        let started = Instant::now();
        self.state = RunState::Running;
        log::info!("Run {run_id} [{tag}] starting with {events} events");

        let physics = self.physics_table.as_slice();
        let result = match self.model {
            ExecutionModel::Sequential => {
                process_events(actions, 0, events, geometry, physics, &mut self.engine)
            }
            ExecutionModel::MultiThreaded { threads } => {
                let workers = u64::from(threads).min(events).max(1);
                let engines: Vec<RandomEngine> = (0..workers).map(|_| self.engine.fork()).collect();
                let outcomes: Vec<SimResult<RunSummary>> = std::thread::scope(|scope| {
                    let handles: Vec<_> = engines
                        .into_iter()
                        .enumerate()
                        .map(|(worker, mut engine)| {
                            let share = events_for_worker(events, workers, worker as u64);
                            scope.spawn(move || {
                                process_events(
                                    actions,
                                    worker,
                                    share,
                                    geometry,
                                    physics,
                                    &mut engine,
                                )
                            })
                        })
                        .collect();
                    handles
                        .into_iter()
                        .enumerate()
                        .map(|(worker, handle)| {
                            handle
                                .join()
                                .unwrap_or(Err(SimError::WorkerPanicked(worker)))
                        })
                        .collect()
                });
                outcomes
                    .into_iter()
                    .try_fold(RunSummary::default(), |mut total, outcome| {
                        total.merge(outcome?);
                        Ok(total)
                    })
            }
        };
        self.state = RunState::Initialized;

        let mut summary = result?;
        summary.run_id = run_id;
        self.next_run_id += 1;
        self.report(&summary, tag, started.elapsed());
        self.last_summary = Some(summary.clone());
        Ok(summary)
    }

    fn report(&self, summary: &RunSummary, tag: uuid::Uuid, elapsed: Duration) {
        log::info!(
            "Run {} [{tag}] finished: {} events, {} sensor hits, {} escaped in {elapsed:?}",
            summary.run_id,
            summary.events,
            summary.hits,
            summary.escaped
        );
        if self.run_verbose > 0 {
            println!(
                "Run {} terminated: {} events processed, {} hits on sensor",
                summary.run_id, summary.events, summary.hits
            );
            if let Some(((column, row), count)) = summary.hottest_pixel() {
                println!("  hottest pixel ({column}, {row}) with {count} hits");
            }
        }
        if self.event_verbose > 0 || self.tracking_verbose > 0 {
            log::debug!(
                "Event verbosity {}, tracking verbosity {}",
                self.event_verbose,
                self.tracking_verbose
            );
        }
    }

    fn run_failure(command: &str, source: SimError) -> CommandError {
        CommandError::Run {
            command: command.to_string(),
            source: Box::new(source),
        }
    }

    /// Applies a `/run/`, `/event/` or `/tracking/` command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotFound`] for unknown commands and wraps run
    /// failures in [`CommandError::Run`].
    pub fn apply_command(&mut self, path: &str, parameters: &str) -> Result<(), CommandError> {
        let invalid = |reason: String| CommandError::InvalidParameter {
            command: path.to_string(),
            reason,
        };
        let level = || {
            parameters
                .trim()
                .parse::<u8>()
                .map_err(|_| invalid(format!("{parameters:?} is not a verbosity level")))
        };

        match path {
            "/run/initialize" => self
                .initialize()
                .map_err(|e| Self::run_failure(path, e)),
            "/run/beamOn" => {
                let events = match parameters.split_whitespace().next() {
                    None => 1,
                    Some(token) => token
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("{token:?} is not an event count")))?,
                };
                self.beam_on(events)
                    .map(|_| ())
                    .map_err(|e| Self::run_failure(path, e))
            }
            "/run/numberOfThreads" => {
                if !matches!(self.state, RunState::Constructed | RunState::Configured) {
                    return Err(CommandError::IllegalState {
                        command: path.to_string(),
                        reason: "worker count is fixed once initialized".to_string(),
                    });
                }
                let threads = parameters
                    .trim()
                    .parse::<u16>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| invalid(format!("{parameters:?} is not a thread count")))?;
                self.set_worker_threads(threads);
                Ok(())
            }
            "/run/verbose" => {
                self.run_verbose = level()?;
                Ok(())
            }
            "/event/verbose" => {
                self.event_verbose = level()?;
                Ok(())
            }
            "/tracking/verbose" => {
                self.tracking_verbose = level()?;
                Ok(())
            }
            _ => Err(CommandError::NotFound(path.to_string())),
        }
    }
}

/// The run controller used by the standalone binary.
pub struct RunManager {
    kernel: RunKernel,
    ui: UiManager,
}

impl RunManager {
    /// Creates a run manager of flavour `kind`.
    #[must_use]
    pub fn new(kind: RunManagerKind, engine: RandomEngine, macro_path: Vec<PathBuf>) -> Self {
        log::debug!("Constructing {kind:?} run manager");
        Self {
            kernel: RunKernel::new(kind, engine),
            ui: UiManager::new(macro_path),
        }
    }

    /// Kernel state, for inspection.
    #[must_use]
    pub const fn kernel(&self) -> &RunKernel {
        &self.kernel
    }

    /// Commands applied successfully so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        self.ui.history()
    }
}

impl CommandInterpreter for RunManager {
    fn apply_command(&mut self, command: &str) -> Result<(), CommandError> {
        self.ui.apply(command, &mut self.kernel)
    }

    fn register_messenger(&mut self, messenger: Box<dyn Messenger>) -> Result<(), CommandError> {
        self.ui.register(messenger)
    }

    fn directories(&self) -> Vec<String> {
        self.ui.directories()
    }
}

impl RunController for RunManager {
    fn set_worker_threads(&mut self, threads: u16) {
        self.kernel.set_worker_threads(threads);
    }

    fn worker_threads(&self) -> Option<u16> {
        self.kernel.worker_threads()
    }

    fn set_detector_construction(&mut self, detector: Box<dyn DetectorConstruction>) {
        self.kernel.detector = Some(detector);
        self.kernel.update_configured();
    }

    fn set_physics_list(&mut self, physics: Box<dyn PhysicsList>) {
        self.kernel.physics = Some(physics);
        self.kernel.update_configured();
    }

    fn set_action_initialization(&mut self, actions: Box<dyn ActionInitialization>) {
        self.kernel.actions = Some(actions);
        self.kernel.update_configured();
    }

    fn initialize(&mut self) -> SimResult<()> {
        self.kernel.initialize()
    }

    fn state(&self) -> RunState {
        self.kernel.state()
    }
}

impl Drop for RunManager {
    fn drop(&mut self) {
        self.kernel.state = RunState::Terminated;
        log::debug!("Run manager released; user initializations destroyed");
    }
}
