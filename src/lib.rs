pub mod cache;
pub mod config;
pub mod ergast;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod scoring;

#[cfg(test)]
mod testing;
