//! chatlens: upload chat exports to an analysis service and browse the
//! results from the terminal or a local dashboard.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod model;
pub mod render;
pub mod store;
pub mod upload;
pub mod web;
