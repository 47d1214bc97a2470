// src/http/mod.rs
//
// HTTP access to the replay service

pub mod client;

pub use client::{HttpClientConfig, ServiceClient};
