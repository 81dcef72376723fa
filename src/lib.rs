//! Point-of-sale backend and client data layer.
//!
//! The backend writes to a primary (cloud) document store and, when online,
//! mirrors successful writes into a secondary (local) store. The client side
//! keeps fetched collections in memory for a few minutes at a time.

pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod http;
pub mod logging;
pub mod model;
pub mod server;
pub mod sync;
