pub mod classifier;
pub mod controller;
pub mod location;
pub mod router;

pub use classifier::NeedClassifier;
pub use controller::IncidentController;
pub use location::LocationResolver;
pub use router::DispatchRouter;
