//! 工單鏈建立
//!
//! 依製程路線的作業順序，為製令展開一串互相連結的工單。

use mes_core::{
    EngineConfig, ManufacturingOrder, MesError, Operation, Result, Routing, Workcenter, WorkOrder,
    WorkOrderState,
};
use rust_decimal::Decimal;

use crate::{ChainActivator, Collaborators, IdentityReconciler, QuantityLedger};

/// 工單工廠
pub struct WorkOrderFactory;

impl WorkOrderFactory {
    /// 生產週期數：ceil(數量 / 工作中心產能)
    pub fn cycle_number(quantity: Decimal, workcenter: &Workcenter) -> Result<Decimal> {
        if workcenter.capacity <= Decimal::ZERO {
            return Err(MesError::InvalidWorkcenter(format!(
                "工作中心 {} 的產能必須大於零",
                workcenter.id
            )));
        }
        Ok((quantity / workcenter.capacity).ceil())
    }

    /// 預計工時（分鐘）
    ///
    /// 準備時間 + 收尾時間 + 週期數 × 每週期時間 × 100 / 時間效率
    pub fn duration_expected(quantity: Decimal, operation: &Operation) -> Result<Decimal> {
        let workcenter = &operation.workcenter;
        if workcenter.time_efficiency <= Decimal::ZERO {
            return Err(MesError::InvalidWorkcenter(format!(
                "工作中心 {} 的時間效率必須大於零",
                workcenter.id
            )));
        }

        let cycles = Self::cycle_number(quantity, workcenter)?;
        Ok(workcenter.time_start
            + workcenter.time_stop
            + cycles * operation.time_cycle * Decimal::from(100) / workcenter.time_efficiency)
    }

    /// 為製令建立工單鏈，回傳新工單的索引（依作業順序）
    ///
    /// 第一站為 `Ready`，其餘為 `Pending`。未指定作業的原料由最後一站承接。
    pub fn create_chain(
        order: &mut ManufacturingOrder,
        routing: &Routing,
        quantity: Decimal,
        services: &Collaborators<'_>,
        config: &EngineConfig,
    ) -> Result<Vec<usize>> {
        if routing.is_empty() {
            return Err(MesError::EmptyRouting(order.name.clone()));
        }
        if !order.work_orders.is_empty() {
            return Err(MesError::ChainAlreadyCreated(order.name.clone()));
        }

        let ledger = QuantityLedger::for_order(order, services.uom);
        let precision = *ledger.precision();
        let initial_producing = ledger.initial_producing(order, quantity);
        let last = routing.operations.len() - 1;
        let mut created = Vec::with_capacity(routing.operations.len());

        for (position, operation) in routing.operations.iter().enumerate() {
            let state = if position == 0 {
                WorkOrderState::Ready
            } else {
                WorkOrderState::Pending
            };
            let duration = Self::duration_expected(quantity, operation)?;

            let mut wo = WorkOrder::from_operation(operation, state, quantity, duration);
            wo.quantity_producing = initial_producing;

            let index = order.work_orders.len();
            order.work_orders.push(wo);

            if let Some(&previous) = created.last() {
                order.work_order_mut(previous)?.next_work_order = Some(index);
                ChainActivator::maybe_activate_next(order, previous, &precision)?;
            }

            Self::assign_moves(order, index, &operation.id, position == last);
            IdentityReconciler::generate_identity_placeholders(order, index, services.uom)?;

            tracing::debug!(
                "建立工單 {}（作業 {}，預計工時 {} 分鐘）",
                operation.name,
                operation.id,
                duration
            );
            created.push(index);
        }

        if config.auto_assign_final_identity && order.product.is_tracked() {
            IdentityReconciler::assign_default_final_identity(
                order,
                created[0],
                services.identities,
            )?;
        }

        tracing::info!(
            "製令 {} 建立 {} 張工單，數量 {}",
            order.name,
            created.len(),
            quantity
        );
        Ok(created)
    }

    /// 將指定作業的移動（最後一站另承接未指定作業的原料）指派給工單
    fn assign_moves(order: &mut ManufacturingOrder, index: usize, operation_id: &str, is_last: bool) {
        let mut assigned = Vec::new();

        for stock_move in order.raw_moves.iter_mut().filter(|m| m.work_order.is_none()) {
            let matches = match &stock_move.operation_id {
                Some(op) => op == operation_id,
                None => is_last,
            };
            if matches {
                stock_move.work_order = Some(index);
                assigned.push(stock_move.id);
            }
        }

        for stock_move in order.finished_moves.iter_mut().filter(|m| {
            m.work_order.is_none() && m.operation_id.as_deref() == Some(operation_id)
        }) {
            stock_move.work_order = Some(index);
            assigned.push(stock_move.id);
        }

        for line in order
            .move_lines
            .iter_mut()
            .filter(|l| assigned.contains(&l.move_id))
        {
            line.work_order = Some(index);
        }
    }
}
