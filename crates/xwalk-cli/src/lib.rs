//! Library side of the `xwalk` command line: configuration, logging and the
//! load/validate/evaluate pipeline.

pub mod config;
pub mod logging;
pub mod pipeline;
