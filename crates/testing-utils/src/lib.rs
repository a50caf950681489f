//! # Responder Testing Utils
//!
//! In-memory fakes for every collaborator trait plus builders for the data
//! model, shared by the unit and integration tests of all workspace crates.
//!
//! ```toml
//! [dev-dependencies]
//! responder-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
