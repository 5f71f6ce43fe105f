#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressError};
pub use progress::{BadgeStatus, ProgressOverview, ProgressTracker, RewardReceipt};
