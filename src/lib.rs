#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod ports;
