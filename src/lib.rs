pub mod api;
pub mod config;
pub mod entities;
pub mod images;
pub mod metrics;
pub mod migrator;
pub mod services;
pub mod telemetry;

pub use sea_orm;
