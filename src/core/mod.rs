//! Console state and the client side of the QueryCache API

pub mod api_client;
pub mod config;
pub mod playground;
pub mod render;
pub mod stats_poller;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
