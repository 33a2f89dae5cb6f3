//! Adapters - HTTP surface in, language model and geocoder out.

pub mod inbound;
pub mod outbound;
