// src/lib.rs — Library root for Apsis

pub mod cli;
pub mod core;
pub mod infra;
pub mod oracle;
pub mod protocol;
pub mod recorder;
pub mod report;
pub mod sim;
pub mod solver;
