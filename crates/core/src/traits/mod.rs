pub mod collaborators;
pub mod pipeline;
pub mod resolver;

pub use collaborators::*;
pub use pipeline::*;
pub use resolver::*;
