//! HTTP surface of the ByteBooks storefront.

pub mod api;
pub mod metrics;
pub mod state;
