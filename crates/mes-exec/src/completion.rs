//! 工單報工引擎
//!
//! 一次報工（`record_production`）在單一製令交易內完成：
//! 元件耗用過帳、暫存明細合併、成品/副產品產出、數量帳更新、
//! 下一站推進，以及是否完工的判斷。

use chrono::{DateTime, Utc};
use mes_core::{
    Identity, ManufacturingOrder, MesError, MoveLine, OrderRecord, Result, StockMove, Tracking,
    UomService, WorkOrderState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{ChainActivator, Collaborators, IdentityReconciler, QuantityLedger};

/// 工單報工引擎
pub struct CompletionEngine;

impl CompletionEngine {
    /// 記錄一次報工
    ///
    /// 唯一會回傳給操作員的驗證錯誤是 `MissingIdentity`；
    /// 其他錯誤代表呼叫順序有誤。任何錯誤都由外層交易整筆捨棄。
    pub fn record_production(
        record: &mut OrderRecord,
        index: usize,
        services: &Collaborators<'_>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let order = &mut record.order;
        let ledger = QuantityLedger::for_order(order, services.uom);
        let precision = *ledger.precision();
        let tracking = order.product.tracking;

        let (name, producing, final_identity, next) = {
            let wo = order.work_order(index)?;
            wo.ensure_actionable("record_production")?;
            (
                wo.name.clone(),
                wo.quantity_producing,
                wo.final_identity.clone(),
                wo.next_work_order,
            )
        };

        if tracking.is_tracked() && final_identity.is_none() && !order.raw_moves_of(index).is_empty()
        {
            return Err(MesError::MissingIdentity(format!(
                "工單 {} 需要成品 {} 的批號/序號",
                name, order.product.id
            )));
        }

        ledger.validate_producing(order.work_order(index)?, producing, tracking)?;
        IdentityReconciler::ensure_component_identities(order, index)?;

        Self::post_consumption(order, index, producing, final_identity.as_ref(), services.uom)?;
        IdentityReconciler::reconcile_active_lines(order, index, final_identity.as_ref(), producing)?;

        if next.is_none() {
            IdentityReconciler::post_finished_product(
                order,
                index,
                final_identity.as_ref(),
                producing,
                services.putaway,
                &precision,
            )?;
            IdentityReconciler::emit_byproducts(
                order,
                index,
                producing,
                services.putaway,
                services.uom,
            )?;
        }

        let posted = {
            let wo = order.work_order_mut(index)?;
            let posted = ledger.post(wo);
            wo.final_identity = None;
            posted
        };
        if let Some(identity) = &final_identity {
            order.hand_off_identity(identity, next);
        }

        ChainActivator::maybe_activate_next(order, index, &precision)?;
        Self::assign_next_producing(order, index, &ledger, services)?;

        if let Some(next) = next {
            if !order.work_order(next)?.state.is_terminal() && tracking.is_tracked() {
                IdentityReconciler::assign_default_final_identity(
                    order,
                    next,
                    services.identities,
                )?;
            }
        }

        let (producing_after, produced, complete) = {
            let wo = order.work_order(index)?;
            (
                wo.quantity_producing,
                wo.quantity_produced,
                ledger.is_complete(wo),
            )
        };

        tracing::info!(
            "工單 {} 報工 {}，累計完成 {}（製令 {}）",
            name,
            posted,
            produced,
            order.name
        );

        if precision.is_zero(producing_after) || complete {
            Self::propagate_final_quantity(order, produced, &ledger, tracking);
            Self::close_step(order, index, now)?;
            ChainActivator::maybe_activate_next(order, index, &precision)?;
        }

        let target = order.work_order(index)?.quantity_to_produce;
        order.product_qty = target;
        let order_id = order.id;
        for transfer in record
            .transfers
            .iter_mut()
            .filter(|t| t.origin_order_id == order_id)
        {
            for stock_move in &mut transfer.moves {
                stock_move.quantity = target;
            }
        }

        Ok(())
    }

    /// 完工
    ///
    /// 已完工時不做任何事；等待中或已取消的工單不能完工。
    pub fn finish(record: &mut OrderRecord, index: usize, now: DateTime<Utc>) -> Result<()> {
        Self::close_step(&mut record.order, index, now)
    }

    /// 開工：開啟工時紀錄，第一次開工時記錄開工時間
    pub fn start(record: &mut OrderRecord, index: usize, now: DateTime<Utc>) -> Result<()> {
        let wo = record.order.work_order_mut(index)?;
        wo.ensure_actionable("start")?;

        wo.state = WorkOrderState::InProgress;
        wo.date_started.get_or_insert(now);
        wo.open_time_log(now);
        tracing::info!("工單 {} 開工", wo.name);
        Ok(())
    }

    /// 暫停：結束工時紀錄，狀態不變
    pub fn pause(record: &mut OrderRecord, index: usize, now: DateTime<Utc>) -> Result<()> {
        let wo = record.order.work_order_mut(index)?;
        wo.ensure_actionable("pause")?;

        let closed = wo.close_time_logs(now);
        tracing::debug!("工單 {} 暫停，結束 {} 筆工時紀錄", wo.name, closed);
        Ok(())
    }

    /// 操作員修改本次報工數量，並重新產生元件批號佔位明細
    pub fn set_quantity_producing(
        record: &mut OrderRecord,
        index: usize,
        quantity: Decimal,
        services: &Collaborators<'_>,
    ) -> Result<()> {
        let order = &mut record.order;
        let ledger = QuantityLedger::for_order(order, services.uom);
        let tracking = order.product.tracking;

        let wo = order.work_order_mut(index)?;
        wo.ensure_actionable("set_quantity_producing")?;
        wo.quantity_producing = ledger.normalize_producing(wo, quantity, tracking)?;

        IdentityReconciler::generate_identity_placeholders(order, index, services.uom)?;
        Ok(())
    }

    /// 操作員輸入成品批號/序號
    pub fn set_final_identity(
        record: &mut OrderRecord,
        index: usize,
        identity: Identity,
    ) -> Result<()> {
        let wo = record.order.work_order_mut(index)?;
        wo.ensure_actionable("set_final_identity")?;
        wo.final_identity = Some(identity);
        Ok(())
    }

    /// 手動登錄元件耗用，建立暫存明細
    ///
    /// 有暫存明細的元件在報工時不再依理論用量自動過帳。
    pub fn log_component(
        record: &mut OrderRecord,
        index: usize,
        product_id: &str,
        identity: Option<Identity>,
        quantity: Decimal,
    ) -> Result<Uuid> {
        let order = &mut record.order;
        order.work_order(index)?.ensure_actionable("log_component")?;

        if quantity < Decimal::ZERO {
            return Err(MesError::InvalidQuantity(format!(
                "耗用數量不可為負: {}",
                quantity
            )));
        }

        let stock_move = order
            .raw_moves_of(index)
            .into_iter()
            .map(|i| &order.raw_moves[i])
            .find(|m| m.product.id == product_id && m.is_open())
            .cloned()
            .ok_or_else(|| MesError::MoveNotFound(product_id.to_string()))?;

        let mut line = MoveLine::for_move(&stock_move, quantity)
            .with_identity(identity)
            .as_temporary();
        line.work_order = Some(index);
        let line_id = line.id;
        order.move_lines.push(line);

        tracing::debug!("工單 #{} 登錄元件 {} 耗用 {}", index, product_id, quantity);
        Ok(line_id)
    }

    /// 為暫存明細（通常是批號佔位明細）填入批號/序號與數量
    pub fn assign_component_identity(
        record: &mut OrderRecord,
        line_id: Uuid,
        identity: Identity,
        quantity: Option<Decimal>,
    ) -> Result<()> {
        let line = record.order.line_mut(line_id)?;
        if !line.is_temporary() {
            return Err(MesError::LineFinalized(line_id));
        }

        if let Some(quantity) = quantity {
            if quantity < Decimal::ZERO {
                return Err(MesError::InvalidQuantity(format!(
                    "耗用數量不可為負: {}",
                    quantity
                )));
            }
            line.qty_done = quantity;
        }
        line.identity = Some(identity);
        Ok(())
    }

    /// 依理論用量過帳不追蹤的元件耗用
    fn post_consumption(
        order: &mut ManufacturingOrder,
        index: usize,
        producing: Decimal,
        final_identity: Option<&Identity>,
        uom: &dyn UomService,
    ) -> Result<()> {
        let tracked_product = order.product.is_tracked();
        let moves: Vec<StockMove> = order
            .raw_moves_of(index)
            .into_iter()
            .map(|i| &order.raw_moves[i])
            .filter(|m| {
                !m.tracking().is_tracked()
                    && m.is_open()
                    && m.from_bom
                    && !m.unit_factor.is_zero()
                    && !order.has_temporary_lines(m.id)
            })
            .cloned()
            .collect();

        for stock_move in moves {
            let precision = uom.rounding_precision(&stock_move.uom);
            let qty = precision.round(producing * stock_move.unit_factor);
            if !precision.is_positive(qty) {
                continue;
            }

            if tracked_product {
                IdentityReconciler::generate_consumed_line(
                    order,
                    stock_move.id,
                    qty,
                    final_identity,
                    None,
                    &precision,
                )?;
            } else if order.lines_of_move(stock_move.id).count() < 2 {
                IdentityReconciler::increment_quantity_done(order, stock_move.id, qty)?;
            } else {
                IdentityReconciler::add_quantity_done(order, stock_move.id, qty, &precision)?;
            }

            tracing::debug!("元件 {} 依用量耗用 {}", stock_move.product.id, qty);
        }

        Ok(())
    }

    /// 計算下一次的報工數量
    fn assign_next_producing(
        order: &mut ManufacturingOrder,
        index: usize,
        ledger: &QuantityLedger,
        services: &Collaborators<'_>,
    ) -> Result<()> {
        if ledger.is_complete(order.work_order(index)?) {
            order.work_order_mut(index)?.quantity_producing = Decimal::ZERO;
            return Ok(());
        }

        if order.product.tracking == Tracking::Serial {
            IdentityReconciler::assign_default_final_identity(order, index, services.identities)?;
            order.work_order_mut(index)?.quantity_producing = Decimal::ONE;
        } else {
            let wo = order.work_order_mut(index)?;
            if !wo.quantity_producing.is_zero() {
                wo.quantity_producing = ledger.remaining(wo);
            }
        }

        IdentityReconciler::generate_identity_placeholders(order, index, services.uom)?;
        Ok(())
    }

    /// 提前結束時，把實際完成數量寫回其他未完工的工單
    ///
    /// 目標數量不會低於工單自己已完成的數量。
    fn propagate_final_quantity(
        order: &mut ManufacturingOrder,
        produced: Decimal,
        ledger: &QuantityLedger,
        tracking: Tracking,
    ) {
        for wo in order
            .work_orders
            .iter_mut()
            .filter(|wo| !wo.state.is_terminal())
        {
            wo.quantity_to_produce = produced.max(wo.quantity_produced);
            wo.quantity_producing = ledger.propagated_producing(wo, tracking);
        }
    }

    /// 完工並結束本站與所有前站的工時紀錄與暫存明細
    fn close_step(order: &mut ManufacturingOrder, index: usize, now: DateTime<Utc>) -> Result<()> {
        let wo = order.work_order(index)?;
        match wo.state {
            WorkOrderState::Done => {
                tracing::debug!("工單 {} 已完工", wo.name);
                return Ok(());
            }
            WorkOrderState::Pending | WorkOrderState::Cancel => {
                return Err(MesError::InvalidState {
                    work_order: wo.name.clone(),
                    state: wo.state,
                    action: "finish",
                });
            }
            WorkOrderState::Ready | WorkOrderState::InProgress => {}
        }

        let mut steps = vec![index];
        steps.extend(order.predecessors(index));
        for step in steps {
            order.work_order_mut(step)?.close_time_logs(now);
            IdentityReconciler::finalize_temporary_lines(order, step);
        }

        let wo = order.work_order_mut(index)?;
        wo.quantity_producing = Decimal::ZERO;
        wo.state = WorkOrderState::Done;
        wo.date_finished = Some(now);
        tracing::info!("工單 {} 完工，完成數量 {}", wo.name, wo.quantity_produced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, WorkOrderFactory};
    use mes_core::{EngineConfig, MoveLineFilter, OutboundTransfer, Product};

    fn prepared(
        order: ManufacturingOrder,
        steps: usize,
        config: &EngineConfig,
        services: &fixtures::Services,
    ) -> OrderRecord {
        let mut order = order;
        let quantity = order.product_qty;
        WorkOrderFactory::create_chain(
            &mut order,
            &fixtures::routing(steps),
            quantity,
            &services.collaborators(),
            config,
        )
        .unwrap();
        fixtures::record(order)
    }

    fn record(record: &mut OrderRecord, index: usize, services: &fixtures::Services) {
        CompletionEngine::record_production(record, index, &services.collaborators(), Utc::now())
            .unwrap();
    }

    #[test]
    fn test_full_quantity_finishes_and_activates_successor() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            3,
            &EngineConfig::default(),
            &services,
        );

        record(&mut rec, 0, &services);
        let order = &rec.order;
        assert_eq!(order.work_orders[0].state, WorkOrderState::Done);
        assert_eq!(order.work_orders[0].quantity_produced, Decimal::from(10));
        assert_eq!(order.work_orders[1].state, WorkOrderState::Ready);
        assert_eq!(order.work_orders[2].state, WorkOrderState::Pending);

        record(&mut rec, 1, &services);
        record(&mut rec, 2, &services);

        let order = &rec.order;
        assert!(order
            .work_orders
            .iter()
            .all(|wo| wo.state == WorkOrderState::Done && wo.quantity_produced == Decimal::from(10)));
        assert_eq!(order.finished_quantity(), Decimal::from(10));
        assert_eq!(order.quantity_done(order.raw_moves[0].id), Decimal::from(20));
    }

    #[test]
    fn test_partial_record_recomputes_producing() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            2,
            &EngineConfig::default(),
            &services,
        );

        CompletionEngine::set_quantity_producing(
            &mut rec,
            0,
            Decimal::from(4),
            &services.collaborators(),
        )
        .unwrap();
        record(&mut rec, 0, &services);

        let wo = &rec.order.work_orders[0];
        assert_eq!(wo.quantity_produced, Decimal::from(4));
        assert_eq!(wo.quantity_producing, Decimal::from(6));
        assert_eq!(wo.state, WorkOrderState::Ready);
        assert_eq!(rec.order.work_orders[1].state, WorkOrderState::Pending);
    }

    #[test]
    fn test_early_close_propagates_and_syncs_transfers() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            2,
            &EngineConfig::default(),
            &services,
        );
        let order_id = rec.order.id;
        rec.transfers.push(
            OutboundTransfer::new("WH/OUT/0001".to_string(), order_id)
                .with_move("BIKE".to_string(), Decimal::from(10)),
        );
        rec.transfers.push(
            OutboundTransfer::new("WH/OUT/0002".to_string(), uuid::Uuid::new_v4())
                .with_move("BIKE".to_string(), Decimal::from(10)),
        );

        let collaborators = services.collaborators();
        CompletionEngine::set_quantity_producing(&mut rec, 0, Decimal::from(6), &collaborators)
            .unwrap();
        record(&mut rec, 0, &services);
        CompletionEngine::set_quantity_producing(&mut rec, 0, Decimal::ZERO, &collaborators)
            .unwrap();
        record(&mut rec, 0, &services);

        let order = &rec.order;
        assert_eq!(order.work_orders[0].state, WorkOrderState::Done);
        assert_eq!(order.work_orders[0].quantity_produced, Decimal::from(6));
        assert_eq!(order.work_orders[1].quantity_to_produce, Decimal::from(6));
        assert_eq!(order.work_orders[1].quantity_producing, Decimal::from(6));
        assert_eq!(order.work_orders[1].state, WorkOrderState::Ready);
        assert_eq!(order.product_qty, Decimal::from(6));
        assert_eq!(rec.transfers[0].moves[0].quantity, Decimal::from(6));
        assert_eq!(rec.transfers[1].moves[0].quantity, Decimal::from(10));
    }

    #[test]
    fn test_missing_final_identity() {
        let services = fixtures::Services::new();
        let config = EngineConfig::default().with_auto_assign_final_identity(false);
        let mut rec = prepared(fixtures::order(Tracking::Lot, 5), 1, &config, &services);

        let result = CompletionEngine::record_production(
            &mut rec,
            0,
            &services.collaborators(),
            Utc::now(),
        );
        assert!(matches!(result, Err(MesError::MissingIdentity(_))));

        CompletionEngine::set_final_identity(&mut rec, 0, Identity::new("LOT-A")).unwrap();
        record(&mut rec, 0, &services);
        let finished = rec
            .order
            .find_lines(&MoveLineFilter::new().product("BIKE"));
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].identity, Some(Identity::new("LOT-A")));
        assert_eq!(finished[0].qty_done, Decimal::from(5));
    }

    #[test]
    fn test_serial_product_one_unit_per_record() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::Serial, 3),
            1,
            &EngineConfig::default(),
            &services,
        );
        let bolt = rec.order.raw_moves[0].id;

        for produced in 1..=3 {
            assert_eq!(rec.order.work_orders[0].quantity_producing, Decimal::ONE);
            record(&mut rec, 0, &services);
            assert_eq!(rec.order.quantity_done(bolt), Decimal::from(produced * 2));
        }

        let order = &rec.order;
        assert_eq!(order.work_orders[0].state, WorkOrderState::Done);
        assert_eq!(order.work_orders[0].quantity_producing, Decimal::ZERO);

        let mut serials: Vec<_> = order
            .find_lines(&MoveLineFilter::new().product("BIKE"))
            .iter()
            .filter_map(|l| l.identity.clone())
            .collect();
        serials.dedup();
        assert_eq!(serials.len(), 3);
    }

    #[test]
    fn test_serial_identity_handed_to_successor() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::Serial, 2),
            2,
            &EngineConfig::default(),
            &services,
        );
        let first = rec.order.work_orders[0].final_identity.clone();
        assert!(first.is_some());

        record(&mut rec, 0, &services);
        assert_eq!(rec.order.work_orders[1].final_identity, first);
        assert_ne!(rec.order.work_orders[0].final_identity, first);
    }

    #[test]
    fn test_logged_component_overrides_theoretical_consumption() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            1,
            &EngineConfig::default(),
            &services,
        );

        CompletionEngine::log_component(&mut rec, 0, "BOLT", None, Decimal::from(5)).unwrap();
        record(&mut rec, 0, &services);

        let bolt = rec.order.raw_moves[0].id;
        assert_eq!(rec.order.quantity_done(bolt), Decimal::from(5));
        assert!(!rec.order.has_temporary_lines(bolt));
    }

    #[test]
    fn test_log_component_unknown_product() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            1,
            &EngineConfig::default(),
            &services,
        );

        let result = CompletionEngine::log_component(&mut rec, 0, "NUT", None, Decimal::ONE);
        assert!(matches!(result, Err(MesError::MoveNotFound(_))));
    }

    #[test]
    fn test_byproducts_posted_on_last_step() {
        let services = fixtures::Services::new();
        let scrap = Product::new("SCRAP".to_string(), "Scrap".to_string());
        let tag = Product::new("TAG".to_string(), "Tag".to_string()).with_tracking(Tracking::Serial);
        let order = fixtures::order(Tracking::None, 4)
            .with_byproduct_move(StockMove::new(scrap, Decimal::from(2), Decimal::new(5, 1)))
            .with_byproduct_move(StockMove::new(tag, Decimal::from(4), Decimal::ONE));
        let mut rec = prepared(order, 2, &EngineConfig::default(), &services);

        record(&mut rec, 0, &services);
        assert!(rec.order.find_lines(&MoveLineFilter::new().product("SCRAP")).is_empty());

        record(&mut rec, 1, &services);
        let scrap_lines = rec.order.find_lines(&MoveLineFilter::new().product("SCRAP"));
        assert_eq!(scrap_lines.len(), 1);
        assert_eq!(scrap_lines[0].qty_done, Decimal::from(2));
        let tag_lines = rec.order.find_lines(&MoveLineFilter::new().product("TAG"));
        assert_eq!(tag_lines.len(), 4);
        assert!(tag_lines.iter().all(|l| l.qty_done == Decimal::ONE));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            2,
            &EngineConfig::default(),
            &services,
        );
        let now = Utc::now();

        assert!(matches!(
            CompletionEngine::finish(&mut rec, 1, now),
            Err(MesError::InvalidState { .. })
        ));

        CompletionEngine::finish(&mut rec, 0, now).unwrap();
        CompletionEngine::finish(&mut rec, 0, now).unwrap();
        let wo = &rec.order.work_orders[0];
        assert_eq!(wo.state, WorkOrderState::Done);
        assert_eq!(wo.quantity_produced, Decimal::ZERO);
        assert_eq!(wo.date_finished, Some(now));

        assert!(matches!(
            CompletionEngine::record_production(&mut rec, 0, &services.collaborators(), now),
            Err(MesError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_start_and_pause_track_time() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            1,
            &EngineConfig::default(),
            &services,
        );
        let started = Utc::now();

        CompletionEngine::start(&mut rec, 0, started).unwrap();
        assert_eq!(rec.order.work_orders[0].state, WorkOrderState::InProgress);
        CompletionEngine::pause(&mut rec, 0, started + chrono::Duration::minutes(30)).unwrap();
        CompletionEngine::start(&mut rec, 0, started + chrono::Duration::minutes(40)).unwrap();
        CompletionEngine::finish(&mut rec, 0, started + chrono::Duration::minutes(50)).unwrap();

        let wo = &rec.order.work_orders[0];
        assert_eq!(wo.date_started, Some(started));
        assert_eq!(wo.time_logs.len(), 2);
        assert_eq!(wo.duration_minutes(), 40);
    }

    #[test]
    fn test_producing_above_remaining_is_rejected_before_posting() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            1,
            &EngineConfig::default(),
            &services,
        );
        rec.order.work_orders[0].quantity_producing = Decimal::from(12);

        assert!(matches!(
            CompletionEngine::record_production(
                &mut rec,
                0,
                &services.collaborators(),
                Utc::now()
            ),
            Err(MesError::QuantityExceedsRemaining { .. })
        ));
        assert_eq!(rec.order.quantity_done(rec.order.raw_moves[0].id), Decimal::ZERO);
        assert_eq!(rec.order.finished_quantity(), Decimal::ZERO);
        assert_eq!(rec.order.work_orders[0].quantity_to_produce, Decimal::from(10));
    }

    #[test]
    fn test_fractional_record_keeps_ledgers_in_step() {
        let services = fixtures::Services::new();
        let mut rec = prepared(
            fixtures::order(Tracking::None, 10),
            1,
            &EngineConfig::default(),
            &services,
        );

        CompletionEngine::set_quantity_producing(
            &mut rec,
            0,
            Decimal::new(3333, 3),
            &services.collaborators(),
        )
        .unwrap();
        record(&mut rec, 0, &services);

        let wo = &rec.order.work_orders[0];
        assert_eq!(wo.quantity_produced, Decimal::new(333, 2));
        assert_eq!(wo.quantity_produced, rec.order.finished_quantity());
        assert_eq!(wo.quantity_producing, Decimal::new(667, 2));
    }

    #[test]
    fn test_component_placeholder_must_be_filled() {
        let services = fixtures::Services::new();
        let chip = Product::new("CHIP".to_string(), "Chip".to_string())
            .with_tracking(Tracking::Lot);
        let order = fixtures::order(Tracking::Lot, 2)
            .with_raw_move(StockMove::new(chip, Decimal::from(2), Decimal::ONE));
        let mut rec = prepared(order, 1, &EngineConfig::default(), &services);

        let placeholder = rec
            .order
            .find_lines(&MoveLineFilter::new().product("CHIP").temporary(true))[0]
            .id;
        let lines_before = rec.order.move_lines.len();
        assert!(matches!(
            CompletionEngine::record_production(
                &mut rec,
                0,
                &services.collaborators(),
                Utc::now()
            ),
            Err(MesError::MissingIdentity(_))
        ));
        // 檢查在任何異動之前完成
        assert_eq!(rec.order.move_lines.len(), lines_before);
        assert_eq!(rec.order.quantity_done(rec.order.raw_moves[0].id), Decimal::ZERO);
        assert_eq!(rec.order.work_orders[0].quantity_produced, Decimal::ZERO);

        CompletionEngine::assign_component_identity(
            &mut rec,
            placeholder,
            Identity::new("CHIP-7"),
            None,
        )
        .unwrap();
        record(&mut rec, 0, &services);

        let chips = rec.order.find_lines(&MoveLineFilter::new().product("CHIP"));
        assert_eq!(chips.len(), 1);
        assert!(!chips[0].is_temporary());
        assert_eq!(chips[0].qty_done, Decimal::from(2));
        assert!(chips[0].produced_identity.is_some());
        assert_eq!(rec.order.quantity_done(rec.order.raw_moves[0].id), Decimal::from(4));

        assert!(matches!(
            CompletionEngine::assign_component_identity(
                &mut rec,
                placeholder,
                Identity::new("CHIP-8"),
                None
            ),
            Err(MesError::LineFinalized(_))
        ));
    }
}
