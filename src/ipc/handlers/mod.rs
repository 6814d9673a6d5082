pub mod backup;
pub mod core;
pub mod planner;
pub mod progress;
pub mod registry;
