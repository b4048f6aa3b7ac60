pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod sink;
pub mod stage;
pub mod transform;
