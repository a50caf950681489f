pub mod category;
pub mod dispatch;
pub mod facility;
pub mod geo;
pub mod incident;
pub mod report;

pub use category::*;
pub use dispatch::*;
pub use facility::*;
pub use geo::*;
pub use incident::*;
pub use report::*;
