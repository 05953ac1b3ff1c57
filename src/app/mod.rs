// csv2timeline - app/mod.rs
//
// Application layer: configuration loading, run orchestration, timeline
// file output.
// Dependencies: core and util layers.
// Must NOT depend on: platform specifics.

pub mod config_loader;
pub mod pipeline;
pub mod timeline_writer;
