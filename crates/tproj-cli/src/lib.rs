//! Library side of the `tproj` command line tool.

pub mod commands;
pub mod config;
pub mod logging;
