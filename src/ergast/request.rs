use std::fmt;

/// A logical upstream request. Determines both the cache key and the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    Schedule { season: u32 },
    Results { season: u32, round: u32 },
    Drivers { season: u32 },
    Constructors { season: u32 },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Schedule { .. } => "schedule",
            Request::Results { .. } => "results",
            Request::Drivers { .. } => "drivers",
            Request::Constructors { .. } => "constructors",
        }
    }

    pub fn season(&self) -> u32 {
        match self {
            Request::Schedule { season }
            | Request::Results { season, .. }
            | Request::Drivers { season }
            | Request::Constructors { season } => *season,
        }
    }

    /// Deterministic cache key, e.g. "results:2023:5"
    pub fn cache_key(&self) -> String {
        match self {
            Request::Results { season, round } => {
                format!("{}:{}:{}", self.kind(), season, round)
            }
            _ => format!("{}:{}", self.kind(), self.season()),
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Request::Schedule { season } => format!("{}.json", season),
            Request::Results { season, round } => format!("{}/{}/results.json", season, round),
            Request::Drivers { season } => format!("{}/drivers.json", season),
            Request::Constructors { season } => format!("{}/constructors.json", season),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}
