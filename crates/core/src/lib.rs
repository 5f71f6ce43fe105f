#![forbid(unsafe_code)]

pub mod model;
pub mod rewards;
pub mod time;

pub use time::Clock;
