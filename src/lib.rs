pub mod app;
pub mod artifacts;
pub mod config;
pub mod patch;
pub mod shared;
