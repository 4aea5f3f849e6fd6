//! Case-centric Event Data
/// Activity projection of event logs (trace variants over a sorted alphabet)
pub mod activity_projection;
#[doc(hidden)]
pub(crate) mod event_log_struct;
#[doc(inline)]
pub use activity_projection::EventLogActivityProjection;
#[doc(inline)]
pub use event_log_struct::*;
