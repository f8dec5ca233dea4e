use super::config::{preset_points, ScoringConfig, POST_2010};

/// Per-position points table. Index 0 holds the points for P1.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsTable {
    name: String,
    points: Vec<f64>,
}

impl Default for PointsTable {
    fn default() -> Self {
        Self::new("post-2010", POST_2010.to_vec())
    }
}

impl PointsTable {
    pub fn new(name: impl Into<String>, points: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Build the table a validated config describes. Falls back to post-2010
    /// when the config names nothing.
    pub fn from_config(config: &ScoringConfig) -> Self {
        if let Some(points) = &config.points {
            return Self::new("custom", points.clone());
        }
        match config.preset.as_deref().and_then(|name| preset_points(name).map(|p| (name, p))) {
            Some((name, points)) => Self::new(name, points.to_vec()),
            None => Self::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Points for a finishing position. Unclassified or out-of-table positions
    /// score zero.
    pub fn score(&self, position: Option<u32>) -> f64 {
        match position {
            Some(p) if p >= 1 => self.points.get(p as usize - 1).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}
