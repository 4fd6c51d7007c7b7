//! 工單鏈推進：判斷下一站是否可以開工

use mes_core::{BatchMode, ManufacturingOrder, QuantityPrecision, Result, WorkOrderState};

/// 工單鏈推進器
pub struct ChainActivator;

impl ChainActivator {
    /// 若前站完成數量已足夠，將等待中的下一站設為可開工
    ///
    /// - 非批次：前站目標數量 ≤ 已完成數量
    /// - 批次：批次大小 ≤ 已完成數量（批次大小超過目標數量時以目標數量為準）
    ///
    /// 只會把 `Pending` 推進到 `Ready`，重複呼叫不會有副作用。回傳是否有推進。
    pub fn maybe_activate_next(
        order: &mut ManufacturingOrder,
        index: usize,
        precision: &QuantityPrecision,
    ) -> Result<bool> {
        let wo = order.work_order(index)?;
        let Some(next) = wo.next_work_order else {
            return Ok(false);
        };

        let threshold = match wo.batch {
            BatchMode::None => wo.quantity_to_produce,
            BatchMode::Batch { size } => size.min(wo.quantity_to_produce),
        };
        let produced = wo.quantity_produced;
        let predecessor = wo.name.clone();

        let successor = order.work_order_mut(next)?;
        if successor.state != WorkOrderState::Pending || !precision.lte(threshold, produced) {
            return Ok(false);
        }

        successor.state = WorkOrderState::Ready;
        tracing::info!(
            "工單 {} 已完成 {}，下一站 {} 可開工",
            predecessor,
            produced,
            successor.name
        );
        Ok(true)
    }
}
