mod crawler;
mod links;

pub use crawler::{Discoverer, DiscoveryLimits, DiscoveryOutcome};
pub use links::extract_links;
