//! Scenario definitions
//!
//! A scenario is an ordered list of declarative HTTP steps loaded from YAML,
//! either one of the built-ins compiled into the binary or a file supplied
//! on the command line.

pub mod builtin;
mod spec;
pub mod template;

pub use spec::{Expect, MultipartSpec, Paths, Scenario, Step};
