pub mod activation;
pub mod cooccurrence;
pub mod retrieval;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod types;
