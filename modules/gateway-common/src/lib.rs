pub mod config;
pub mod time;

pub use config::{parse_list, Config};
