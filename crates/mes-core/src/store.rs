//! 帳本儲存介面

use uuid::Uuid;

use crate::{ManufacturingOrder, MoveLine, MoveLineFilter, OrderRecord, OutboundTransfer, Result};

/// 帳本儲存
///
/// 以製令為原子單位：`transaction` 內的所有修改要嘛全部生效，要嘛全部捨棄；
/// 同一張製令的交易必須互斥執行。
pub trait LedgerStore: Send + Sync {
    /// 新增製令
    fn insert_order(&self, order: ManufacturingOrder) -> Result<()>;

    /// 讀取製令快照
    fn load_order(&self, order_id: Uuid) -> Result<ManufacturingOrder>;

    /// 附加由製令產生的出貨調撥單
    fn attach_transfer(&self, transfer: OutboundTransfer) -> Result<()>;

    /// 查詢來源為該製令的出貨調撥單
    fn transfers_for(&self, order_id: Uuid) -> Result<Vec<OutboundTransfer>>;

    /// 依條件查詢移動明細
    fn find_move_lines(&self, order_id: Uuid, filter: &MoveLineFilter) -> Result<Vec<MoveLine>> {
        let order = self.load_order(order_id)?;
        Ok(order.find_lines(filter).into_iter().cloned().collect())
    }

    /// 在單一製令上執行原子交易
    fn transaction<T, F>(&self, order_id: Uuid, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut OrderRecord) -> Result<T>;
}
