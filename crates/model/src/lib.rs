//! Fleet reconciler data model
//!
//! Shared record types describing a managed cluster and its desired
//! configuration. These are the minimal in-memory shapes needed to drive
//! scheduling; persistence lives elsewhere.

pub mod cluster;
pub mod component;
pub mod error;
pub mod scheduling;
pub mod state;

pub use cluster::*;
pub use component::*;
pub use error::*;
pub use scheduling::*;
pub use state::*;
