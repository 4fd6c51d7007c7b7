//! 髒標記追蹤

use std::collections::HashSet;

use uuid::Uuid;

/// 髒標記追蹤器：記錄交易已提交、尚未持久化的製令
#[derive(Debug)]
pub struct DirtyTracker {
    dirty_orders: HashSet<Uuid>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self {
            dirty_orders: HashSet::new(),
        }
    }

    /// 標記製令為髒
    pub fn mark_dirty(&mut self, order_id: Uuid) {
        self.dirty_orders.insert(order_id);
    }

    /// 檢查製令是否為髒
    pub fn is_dirty(&self, order_id: &Uuid) -> bool {
        self.dirty_orders.contains(order_id)
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_orders.clear();
    }

    /// 取出並清除所有髒製令
    pub fn take(&mut self) -> Vec<Uuid> {
        self.dirty_orders.drain().collect()
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}
