//! Command implementations for the CLI.
//!
//! The binary is a thin wrapper over [`report_cmd`], which holds the full
//! load / carry-forward / allocate / render pipeline.

pub mod report_cmd;
