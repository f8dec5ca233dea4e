use serde::{Deserialize, Serialize};

/// Points awarded for P1..P10 since 2010.
pub const POST_2010: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];
pub const FROM_2003_TO_2009: [f64; 8] = [10.0, 8.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
pub const FROM_1991_TO_2002: [f64; 6] = [10.0, 6.0, 4.0, 3.0, 2.0, 1.0];

/// Names accepted by `scoring.preset`
pub const PRESETS: [&str; 3] = ["post-2010", "2003-2009", "1991-2002"];

pub fn preset_points(name: &str) -> Option<&'static [f64]> {
    match name {
        "post-2010" => Some(&POST_2010),
        "2003-2009" => Some(&FROM_2003_TO_2009),
        "1991-2002" => Some(&FROM_1991_TO_2002),
        _ => None,
    }
}

/// Scoring section of the config file.
///
/// Either names a preset or lists the points for P1, P2, ... explicitly.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   preset: post-2010
/// ```
/// or
/// ```yaml
/// scoring:
///   points: [10, 6, 4, 3, 2, 1]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub preset: Option<String>,

    #[serde(default)]
    pub points: Option<Vec<f64>>,
}
