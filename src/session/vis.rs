//! Visualization manager.
//!
//! Rendering itself is delegated; this manager owns the scene description
//! that `/vis/` commands build up and reports it through the log.

use crate::errors::{CommandError, SimResult};
use crate::interfaces::{CommandInterpreter, Messenger, Visualization};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Verbosity of the visualization manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Nothing but failures
    Quiet,
    /// Errors only
    Errors,
    /// Errors and warnings
    Warnings,
    /// Confirmation of each command
    Confirmations,
    /// Command parameters as well
    Parameters,
    /// Everything
    All,
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "0" => Ok(Self::Quiet),
            "errors" | "1" => Ok(Self::Errors),
            "warnings" | "2" => Ok(Self::Warnings),
            "confirmations" | "3" => Ok(Self::Confirmations),
            "parameters" | "4" => Ok(Self::Parameters),
            "all" | "5" => Ok(Self::All),
            other => Err(format!("unknown verbosity {other:?}")),
        }
    }
}

/// Scene state shared between the manager and its messenger.
#[derive(Debug, Default)]
struct Scene {
    open: bool,
    enabled: bool,
    viewer: Option<String>,
    commands: Vec<String>,
}

type SharedScene = Arc<Mutex<Scene>>;

const VIS_COMMANDS: &[&str] = &[
    "open",
    "enable",
    "disable",
    "verbose",
    "drawVolume",
    "viewer/set/autoRefresh",
    "viewer/set/viewpointThetaPhi",
    "viewer/flush",
    "scene/add/trajectories",
    "scene/add/hits",
    "scene/endOfEventAction",
];

struct VisMessenger {
    scene: SharedScene,
    verbosity: Verbosity,
}

impl Messenger for VisMessenger {
    fn directory(&self) -> &str {
        "/vis/"
    }

    fn commands(&self) -> &[&'static str] {
        VIS_COMMANDS
    }

    fn apply(&mut self, command: &str, parameters: &str) -> Result<(), CommandError> {
        let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
        if !scene.open {
            return Err(CommandError::IllegalState {
                command: format!("/vis/{command}"),
                reason: "visualization manager has been released".to_string(),
            });
        }

        match command {
            "open" => {
                let viewer = parameters.split_whitespace().next().unwrap_or("TSG");
                scene.viewer = Some(viewer.to_string());
            }
            "enable" => scene.enabled = true,
            "disable" => scene.enabled = false,
            "verbose" => {
                self.verbosity =
                    parameters
                        .trim()
                        .parse()
                        .map_err(|reason| CommandError::InvalidParameter {
                            command: "/vis/verbose".to_string(),
                            reason,
                        })?;
            }
            _ if VIS_COMMANDS.contains(&command) || command.contains('/') => {}
            _ => return Err(CommandError::NotFound(format!("/vis/{command}"))),
        }

        if self.verbosity >= Verbosity::Confirmations {
            log::info!("/vis/{command} {parameters}");
        }
        scene.commands.push(format!("/vis/{command} {parameters}").trim_end().to_string());
        Ok(())
    }
}

/// Visualization manager handed to the interactive session.
pub struct VisManager {
    verbosity: Verbosity,
    scene: SharedScene,
}

impl VisManager {
    /// Creates a manager; commands become available after `initialize`.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            scene: SharedScene::default(),
        }
    }

    /// Viewer opened by `/vis/open`, if any.
    #[must_use]
    pub fn viewer(&self) -> Option<String> {
        self.scene
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .viewer
            .clone()
    }

    /// Whether drawing is enabled (`/vis/enable`, `/vis/disable`).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.scene
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled
    }

    /// Scene commands applied so far.
    #[must_use]
    pub fn scene_commands(&self) -> Vec<String> {
        self.scene
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .commands
            .clone()
    }
}

impl Visualization for VisManager {
    fn initialize(&mut self, interpreter: &mut dyn CommandInterpreter) -> SimResult<()> {
        {
            let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
            scene.open = true;
            scene.enabled = true;
        }
        interpreter.register_messenger(Box::new(VisMessenger {
            scene: Arc::clone(&self.scene),
            verbosity: self.verbosity,
        }))?;
        if self.verbosity > Verbosity::Quiet {
            log::info!("Visualization manager initialized ({:?})", self.verbosity);
        }
        Ok(())
    }
}

impl Drop for VisManager {
    fn drop(&mut self) {
        let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
        scene.open = false;
        log::debug!(
            "Visualization manager released after {} scene commands",
            scene.commands.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunManagerKind;
    use crate::kernel::run_manager::RunManager;
    use crate::random::RandomEngine;

    fn interpreter() -> RunManager {
        RunManager::new(RunManagerKind::Serial, RandomEngine::default(), Vec::new())
    }

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("Quiet".parse::<Verbosity>(), Ok(Verbosity::Quiet));
        assert_eq!("3".parse::<Verbosity>(), Ok(Verbosity::Confirmations));
        assert!("chatty".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_commands_need_initialize() {
        let mut run = interpreter();
        let _vis = VisManager::new(Verbosity::Quiet);
        assert!(matches!(
            run.apply_command("/vis/open TSG"),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn test_scene_commands_recorded() {
        let mut run = interpreter();
        let mut vis = VisManager::new(Verbosity::Quiet);
        vis.initialize(&mut run).expect("initialize");

        run.apply_command("/vis/open OGL 600x600-0+0").expect("open");
        run.apply_command("/vis/drawVolume").expect("draw");
        run.apply_command("/vis/viewer/set/style wireframe").expect("nested command");
        assert!(run.apply_command("/vis/explode").is_err());

        assert_eq!(vis.viewer().as_deref(), Some("OGL"));
        assert_eq!(vis.scene_commands().len(), 3);

        assert!(vis.is_enabled());
        run.apply_command("/vis/disable").expect("disable");
        assert!(!vis.is_enabled());
    }

    #[test]
    fn test_released_manager_refuses_commands() {
        let mut run = interpreter();
        let mut vis = VisManager::new(Verbosity::Quiet);
        vis.initialize(&mut run).expect("initialize");
        drop(vis);

        assert!(matches!(
            run.apply_command("/vis/drawVolume"),
            Err(CommandError::IllegalState { .. })
        ));
    }

    #[test]
    fn test_single_vis_manager_per_interpreter() {
        let mut run = interpreter();
        let mut first = VisManager::new(Verbosity::Quiet);
        let mut second = VisManager::new(Verbosity::Quiet);
        first.initialize(&mut run).expect("first");
        assert!(second.initialize(&mut run).is_err());
    }
}
