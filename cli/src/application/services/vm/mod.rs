//! Application services for the VM lifecycle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

pub mod lifecycle;

pub use lifecycle::{
    CreatedResources, DEFAULT_MAX_WAIT, HostSpec, POLL_INTERVAL, Readiness, TeardownReport,
    create_host, create_host_recording, delete_host, delete_host_and_dependencies, get_host,
    list_hosts, wait_until_running,
};
