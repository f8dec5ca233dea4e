use super::config::{preset_points, ScoringConfig, PRESETS};

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.preset.is_some() && config.points.is_some() {
        errors.push("scoring: set either preset or points, not both".to_string());
    }

    if let Some(ref preset) = config.preset {
        if preset_points(preset).is_none() {
            errors.push(format!(
                "scoring.preset: unknown preset '{}' (expected one of: {})",
                preset,
                PRESETS.join(", ")
            ));
        }
    }

    if let Some(ref points) = config.points {
        if points.is_empty() {
            errors.push("scoring.points: must list at least one position".to_string());
        }
        for (i, value) in points.iter().enumerate() {
            if !value.is_finite() {
                errors.push(format!("scoring.points[{}]: must be a finite number", i));
            } else if *value < 0.0 {
                errors.push(format!("scoring.points[{}]: must be non-negative", i));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
