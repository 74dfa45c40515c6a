//! aeoracle-http — reads chain height from a node's public HTTP API.

pub mod client;

pub use client::{HttpClientConfig, HttpHeightClient, TopResponse};
