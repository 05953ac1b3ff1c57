// csv2timeline - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library plus data crates (csv, chrono, regex, glob,
// walkdir); never opens files itself except through discovery's directory
// listing.
// Must NOT depend on: platform, app.

pub mod config;
pub mod discovery;
pub mod export;
pub mod filter;
pub mod matcher;
pub mod message;
pub mod model;
pub mod timeline;
pub mod timestamp;
