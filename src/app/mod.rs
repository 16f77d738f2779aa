pub mod cli;
pub mod command_catalog;
pub mod command_dispatch;
