pub mod api;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod pathfinder;
pub mod places;
pub mod planner;
pub mod player;
pub mod policy;
pub mod pow;
pub mod puzzle;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod transport;
pub mod travel;

#[cfg(test)]
pub(crate) mod fake_world;
