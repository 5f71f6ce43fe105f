mod badges;
mod overview;
mod tracker;

pub use badges::is_unlocked;
pub use overview::{BadgeStatus, ProgressOverview};
pub use tracker::{ProgressTracker, RewardReceipt};
