mod endpoint;
mod engine;

pub use endpoint::EndpointParser;
pub use engine::Auditor;
