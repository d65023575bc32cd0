// Declare modules at the root level
pub mod chart;
pub mod classifier;
pub mod domain;
pub mod error;
pub mod grouping;
pub mod scheduler;
pub mod sensor_schema;
pub mod slots;
pub mod status;
pub mod telemetry;
pub mod time;
pub mod units;
pub mod view;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::chart;
    pub use super::classifier;
    pub use super::domain;
    pub use super::error;
    pub use super::grouping;
    pub use super::scheduler;
    pub use super::sensor_schema;
    pub use super::slots;
    pub use super::status;
    pub use super::telemetry;
    pub use super::time;
    pub use super::units;
    pub use super::view;
}

// Also re-export at root for convenience
pub use chart::*;
pub use classifier::*;
pub use domain::*;
pub use error::*;
pub use grouping::*;
pub use scheduler::*;
pub use sensor_schema::*;
pub use slots::*;
pub use status::*;
pub use telemetry::*;
pub use time::*;
pub use units::*;
pub use view::*;
