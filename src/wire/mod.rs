//! Wire protocol surface: the closed URN/wire-type schema and the compact
//! payload encoders.

pub mod codec;
pub mod urn;

pub use codec::{encode_counter, encode_distribution, encode_latest};
pub use urn::{MetricUrn, WireType, ALL_URNS};
