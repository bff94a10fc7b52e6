mod builder;
mod file;

pub use builder::{CliOverrides, build_config};
