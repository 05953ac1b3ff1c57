// csv2timeline - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: standard library, directories, toml, glob, chrono.
// Must NOT depend on: core, app.

pub mod config;
