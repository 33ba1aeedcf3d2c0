//! globe-core - Core library for Globe
//!
//! This crate contains the country models, the durable store, the remote
//! catalog client and the cache managers used by every Globe front end.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod favorites;
pub mod location;
pub mod models;
pub mod remote;
pub mod resolve;
pub mod search;
pub mod services;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{Country, Currency};
