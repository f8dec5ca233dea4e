pub mod client;
pub mod normalize;
pub mod request;
pub mod types;

pub use client::{create_client, ErgastClient, RemoteSource};
pub use normalize::Table;
pub use request::Request;
pub use types::{NameTable, RaceEvent, RaceResultRow, RaceResults, Schedule};
