//! Emergency incident intake and facility-matching dispatch service.
//!
//! The binary wires configuration-built collaborators into an [`app::Application`];
//! integration tests build the same application around in-memory doubles.

pub mod app;
pub mod shutdown;

pub use app::{Application, Collaborators};
pub use shutdown::{wait_for_shutdown_signal, ShutdownManager};
