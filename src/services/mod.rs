pub mod adapters;
pub mod droid;
pub mod normalizer;
pub mod openai_client;
pub mod orchestrator;
pub mod relevance_filter;
pub mod relevance_scorer;
pub mod search_pipeline;
pub mod session_manager;

pub use adapters::*;
pub use droid::*;
pub use normalizer::*;
pub use openai_client::*;
pub use orchestrator::*;
pub use relevance_filter::*;
pub use relevance_scorer::*;
pub use search_pipeline::*;
pub use session_manager::*;


#[cfg(test)]
pub use testing::*;
