//! Integration tests for dockhand CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reach a cloud account or a remote host.

mod cli_tests;
mod config_command;
