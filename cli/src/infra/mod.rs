//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! cloud CLI adapter, SSH/SFTP sessions, key generation, and local files.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod azure;
pub mod command_runner;
pub mod config;
pub mod crypto;
pub mod fs;
pub mod probe;
pub mod registry;
pub mod ssh;
