//! Client for the remote text-intelligence service (search, summarize, extract).

pub mod client;
pub(crate) mod types;

pub use client::ServiceClient;
