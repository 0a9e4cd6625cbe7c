use super::schema::Config;
use crate::decisions::Chamber;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = config.chamber.parse::<Chamber>() {
        errors.push(format!("chamber: {}", e));
    }

    let tolerance = config.validation.tolerance;
    if !(tolerance > 0.0 && tolerance < 1.0) {
        errors.push(format!(
            "validation.tolerance: must be between 0 and 1, got {}",
            tolerance
        ));
    }

    if config.validation.sample_size == 0 {
        errors.push("validation.sample_size: must be greater than 0".to_string());
    }

    for (i, party) in config.banned_parties.iter().enumerate() {
        if party.trim().is_empty() {
            errors.push(format!("banned_parties[{}]: must not be empty", i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
