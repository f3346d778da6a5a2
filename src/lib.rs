pub mod abilities;
pub mod benchmark;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod hit_score;
pub mod intercept;
pub mod objective;
pub mod pocket;
pub mod scenario;
pub mod snapshot;
pub mod steering;
pub mod targeting;
pub mod threat;
pub mod threat_level;
pub mod util;
