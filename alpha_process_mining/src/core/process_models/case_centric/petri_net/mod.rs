//! Petri nets with markings and firing semantics
pub(crate) mod marking;
pub(crate) mod petri_net_struct;
#[doc(inline)]
pub use marking::*;
#[doc(inline)]
pub use petri_net_struct::*;
