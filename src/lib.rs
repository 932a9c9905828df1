#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod app;
pub mod classification;
pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod healthcheck;
pub mod observability;
pub mod port;
#[doc(hidden)]
pub mod test_support;

pub use classification::WasteClassifier;
pub use healthcheck::{healthcheck, healthcheck_with_port};
