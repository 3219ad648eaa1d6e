//! Unit conversion for command parameters. Internal units are MeV and mm.

/// Factor converting `unit` to MeV.
#[must_use]
pub fn energy_unit(unit: &str) -> Option<f64> {
    match unit {
        "eV" => Some(1e-6),
        "keV" => Some(1e-3),
        "MeV" => Some(1.0),
        "GeV" => Some(1e3),
        "TeV" => Some(1e6),
        _ => None,
    }
}

/// Factor converting `unit` to mm.
#[must_use]
pub fn length_unit(unit: &str) -> Option<f64> {
    match unit {
        "nm" => Some(1e-6),
        "um" => Some(1e-3),
        "mm" => Some(1.0),
        "cm" => Some(10.0),
        "m" => Some(1e3),
        _ => None,
    }
}

fn parse_number(token: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("{token:?} is not a number"))
}

/// Parses `<value> [unit]`, where a missing unit means `default_unit`.
///
/// # Errors
///
/// Returns a message for missing values, non-numeric values, unknown units
/// and trailing tokens.
pub fn parse_quantity(
    parameters: &str,
    default_unit: &str,
    unit_factor: fn(&str) -> Option<f64>,
) -> Result<f64, String> {
    let mut tokens = parameters.split_whitespace();
    let value = parse_number(tokens.next().ok_or("missing value")?)?;
    let unit = tokens.next().unwrap_or(default_unit);
    if tokens.next().is_some() {
        return Err("too many parameters".to_string());
    }
    let factor = unit_factor(unit).ok_or_else(|| format!("unknown unit {unit:?}"))?;
    Ok(value * factor)
}

/// Parses `<x> <y> <z> [unit]`; without `unit_factor` no unit is accepted.
///
/// # Errors
///
/// Returns a message when fewer than three numbers are given or the unit is
/// unknown.
pub fn parse_vector(
    parameters: &str,
    default_unit: &str,
    unit_factor: Option<fn(&str) -> Option<f64>>,
) -> Result<[f64; 3], String> {
    let tokens: Vec<&str> = parameters.split_whitespace().collect();
    let max_tokens = if unit_factor.is_some() { 4 } else { 3 };
    if tokens.len() < 3 || tokens.len() > max_tokens {
        return Err(format!("expected 3 components, got {:?}", parameters.trim()));
    }
    let factor = match unit_factor {
        Some(lookup) => {
            let unit = tokens.get(3).copied().unwrap_or(default_unit);
            lookup(unit).ok_or_else(|| format!("unknown unit {unit:?}"))?
        }
        None => 1.0,
    };
    Ok([
        parse_number(tokens[0])? * factor,
        parse_number(tokens[1])? * factor,
        parse_number(tokens[2])? * factor,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_quantities() {
        assert_relative_eq!(parse_quantity("60 keV", "MeV", energy_unit).unwrap(), 0.06);
        assert_relative_eq!(parse_quantity("2", "MeV", energy_unit).unwrap(), 2.0);
        assert!(parse_quantity("60 furlongs", "MeV", energy_unit).is_err());
        assert!(parse_quantity("", "MeV", energy_unit).is_err());
        assert!(parse_quantity("1 keV extra", "MeV", energy_unit).is_err());
        assert!(parse_quantity("NaN keV", "MeV", energy_unit).is_err());
    }

    #[test]
    fn test_vectors() {
        let position = parse_vector("1 2 -3 cm", "mm", Some(length_unit)).unwrap();
        assert_relative_eq!(position[0], 10.0);
        assert_relative_eq!(position[2], -30.0);

        let direction = parse_vector("0 0 1", "", None).unwrap();
        assert_relative_eq!(direction[2], 1.0);

        assert!(parse_vector("0 0 1 mm", "", None).is_err());
        assert!(parse_vector("0 1", "mm", Some(length_unit)).is_err());
    }
}
