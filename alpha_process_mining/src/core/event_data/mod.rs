//! Event Data
//!
//! Event logs and their activity projection
pub mod case_centric;

#[doc(inline)]
pub use case_centric::EventLog;
