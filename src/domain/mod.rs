//! Domain logic - pure release rules independent of git, gh and the terminal

pub mod branch;
pub mod suffix;
pub mod version;

pub use branch::ReleaseBranch;
pub use suffix::{compute_suffixed_version, next_increment, timestamp_suffix, SuffixStrategy};
pub use version::{compare_bump_level, BumpLevel, Version};
