// Library exports for ordermetrics crate
// This allows tests and the daemon binary to use the modules

pub mod cards;
pub mod config;
pub mod email;
pub mod error;
pub mod imap_client;
pub mod output_writer;
pub mod poll_cycle;
pub mod state;
