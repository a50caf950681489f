//! HTTP clients for the external collaborators and the result delivery sink.

pub mod facilities;
pub mod http;
pub mod knowledge;
pub mod llm;
pub mod maps;
pub mod notifier;
pub mod report;
pub mod sink;
pub mod timeout_handler;

pub use facilities::FacilityTableDirectory;
pub use knowledge::ReferenceSearchClient;
pub use llm::{build_text_understanding, ChatCompletionsClient, GeminiClient};
pub use maps::{GoogleMapsGeocoder, PlacesDirectory};
pub use notifier::VapiNotifier;
pub use report::BackendReportSink;
pub use sink::{spoken_summary, DeliveryResultSink};
pub use timeout_handler::{TimeoutConfig, TimeoutHandler};
