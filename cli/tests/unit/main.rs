//! Unit tests for dockhand CLI
//!
//! These tests drive the public API with scripted fakes and run fast without
//! external I/O.

mod architecture;
mod helpers;
mod property_tests;
