pub mod catalog;
pub mod client;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod output;
pub mod resolve;
pub mod transport;
