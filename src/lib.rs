//! Human image classifier.
//!
//! A small catalog of the images in one directory, a fixed tag vocabulary
//! grouped by super-category, and an HTTP API to tag images.

pub mod config;
pub mod db;
pub mod export;
pub mod init;
pub mod logging;
pub mod scanner;
pub mod server;
pub mod tags;

pub use db::{Catalog, CatalogError};
