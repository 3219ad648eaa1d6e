//! The `/gun/` messenger configuring the primary generator.

use crate::errors::CommandError;
use crate::interfaces::Messenger;
use crate::kernel::units::{energy_unit, length_unit, parse_quantity, parse_vector};
use crate::medipix::gun::SharedGunSettings;
use std::sync::PoisonError;

const GUN_COMMANDS: &[&str] = &["particle", "energy", "position", "direction", "spread"];

/// Messenger writing the shared gun settings.
#[derive(Debug, Clone)]
pub struct PrimaryGeneratorMessenger {
    settings: SharedGunSettings,
}

impl PrimaryGeneratorMessenger {
    /// Creates the messenger over `settings`.
    #[must_use]
    pub const fn new(settings: SharedGunSettings) -> Self {
        Self { settings }
    }
}

impl Messenger for PrimaryGeneratorMessenger {
    fn directory(&self) -> &str {
        "/gun/"
    }

    fn commands(&self) -> &[&'static str] {
        GUN_COMMANDS
    }

    fn apply(&mut self, command: &str, parameters: &str) -> Result<(), CommandError> {
        let invalid = |reason: String| CommandError::InvalidParameter {
            command: format!("/gun/{command}"),
            reason,
        };
        let mut settings = self.settings.lock().unwrap_or_else(PoisonError::into_inner);

        match command {
            "particle" => {
                let mut tokens = parameters.split_whitespace();
                match (tokens.next(), tokens.next()) {
                    (Some(name), None) => settings.particle = name.to_string(),
                    _ => return Err(invalid("expected one particle name".to_string())),
                }
            }
            "energy" => {
                let energy = parse_quantity(parameters, "GeV", energy_unit).map_err(invalid)?;
                if energy <= 0.0 {
                    return Err(invalid("energy must be positive".to_string()));
                }
                settings.energy_mev = energy;
            }
            "position" => {
                settings.position_mm =
                    parse_vector(parameters, "cm", Some(length_unit)).map_err(invalid)?;
            }
            "direction" => {
                let [x, y, z] = parse_vector(parameters, "", None).map_err(invalid)?;
                let norm = (x.mul_add(x, y.mul_add(y, z * z))).sqrt();
                if norm == 0.0 {
                    return Err(invalid("direction must be non-zero".to_string()));
                }
                settings.direction = [x / norm, y / norm, z / norm];
            }
            "spread" => {
                let spread = parse_quantity(parameters, "mm", length_unit).map_err(invalid)?;
                if spread < 0.0 {
                    return Err(invalid("spread must not be negative".to_string()));
                }
                settings.spread_mm = spread;
            }
            _ => return Err(CommandError::NotFound(format!("/gun/{command}"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn messenger() -> (PrimaryGeneratorMessenger, SharedGunSettings) {
        let settings = SharedGunSettings::default();
        (PrimaryGeneratorMessenger::new(settings.clone()), settings)
    }

    #[test]
    fn test_gun_commands() {
        let (mut messenger, settings) = messenger();
        messenger.apply("particle", "e-").expect("particle");
        messenger.apply("energy", "120 keV").expect("energy");
        messenger.apply("position", "0 0 -5").expect("position");
        messenger.apply("direction", "0 3 4").expect("direction");
        messenger.apply("spread", "1.5 mm").expect("spread");

        let settings = settings.lock().expect("lock");
        assert_eq!(settings.particle, "e-");
        assert_relative_eq!(settings.energy_mev, 0.12);
        assert_relative_eq!(settings.position_mm[2], -50.0);
        assert_relative_eq!(settings.direction[1], 0.6);
        assert_relative_eq!(settings.direction[2], 0.8);
        assert_relative_eq!(settings.spread_mm, 1.5);
    }

    #[test]
    fn test_rejected_parameters() {
        let (mut messenger, _) = messenger();
        assert!(messenger.apply("particle", "").is_err());
        assert!(messenger.apply("energy", "-1 MeV").is_err());
        assert!(messenger.apply("direction", "0 0 0").is_err());
        assert!(messenger.apply("spread", "-1").is_err());
        assert!(matches!(
            messenger.apply("polarization", "1 0 0"),
            Err(CommandError::NotFound(_))
        ));
    }
}
