//! Wire-level types shared between the satellite manager and its collaborators.
//!
//! This crate holds only data: addresses, the inter-node message envelope,
//! and the error taxonomy. It has no opinions about transport, asynchrony,
//! or storage - those live in `satellite`.

pub mod address;
pub mod errors;
pub mod messages;

pub use address::{Address, AddressConfig};
pub use errors::{SatelliteError, SatelliteResult};
pub use messages::{Message, MessageKind, ParamValue, PeerSatellite};
