//! # MES Store
//!
//! 帳本儲存：以製令為單位加鎖的記憶體帳本與異動追蹤

pub mod dirty_tracking;
pub mod memory;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use memory::InMemoryLedger;
