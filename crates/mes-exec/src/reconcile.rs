//! 批號/序號歸屬與移動明細合併
//!
//! 報工過程中產生的暫存明細，依「產品 + 批號」合併到既有明細，
//! 或直接轉為正式明細，並記錄它們歸屬的成品批號。

use mes_core::{
    Identity, IdentityService, ManufacturingOrder, MesError, MoveLine, MoveLineFilter,
    PutawayService, QuantityPrecision, Result, Tracking, UomService,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// 批號/序號歸屬處理器
pub struct IdentityReconciler;

impl IdentityReconciler {
    /// 為工單指派預設的成品批號/序號
    ///
    /// 優先使用前站交接過來的批號；沒有時才向配發服務要一個新的。
    pub fn assign_default_final_identity(
        order: &mut ManufacturingOrder,
        index: usize,
        identities: &dyn IdentityService,
    ) -> Result<Option<Identity>> {
        let identity = match order.hint_for(index) {
            Some(hint) => Some(hint.clone()),
            None => identities.default_identity_for(&order.product),
        };

        let wo = order.work_order_mut(index)?;
        wo.final_identity = identity.clone();
        tracing::debug!("工單 {} 預設成品批號: {:?}", wo.name, identity);
        Ok(identity)
    }

    /// 重新產生追蹤元件的批號佔位明細
    ///
    /// 舊的（尚未填寫批號的）佔位明細會先刪除；序號元件每件一筆。
    pub fn generate_identity_placeholders(
        order: &mut ManufacturingOrder,
        index: usize,
        uom: &dyn UomService,
    ) -> Result<usize> {
        let producing = order.work_order(index)?.quantity_producing;
        let tracked_moves: Vec<_> = order
            .raw_moves_of(index)
            .into_iter()
            .map(|i| &order.raw_moves[i])
            .filter(|m| {
                m.is_open()
                    && m.tracking().is_tracked()
                    && m.from_bom
                    && m.product.id != order.product.id
            })
            .cloned()
            .collect();

        let mut created = 0;
        for stock_move in tracked_moves {
            order.move_lines.retain(|l| {
                !(l.move_id == stock_move.id
                    && l.is_temporary()
                    && l.identity.is_none()
                    && l.work_order == Some(index))
            });

            let precision = uom.rounding_precision(&stock_move.uom);
            let mut qty = precision.round(stock_move.unit_factor * producing);

            if stock_move.tracking() == Tracking::Serial {
                while precision.is_positive(qty) {
                    let unit = qty.min(Decimal::ONE);
                    let mut line = MoveLine::for_move(&stock_move, unit).as_temporary();
                    line.work_order = Some(index);
                    order.move_lines.push(line);
                    qty -= Decimal::ONE;
                    created += 1;
                }
            } else if precision.is_positive(qty) {
                let mut line = MoveLine::for_move(&stock_move, qty).as_temporary();
                line.work_order = Some(index);
                order.move_lines.push(line);
                created += 1;
            }
        }

        Ok(created)
    }

    /// 記錄追蹤成品的元件耗用
    ///
    /// 先用完相同元件批號、尚未歸屬的既有明細的預留量（部分耗用時拆分明細），
    /// 剩餘數量再建立新明細。所有耗用都歸屬到 `final_identity`。
    pub fn generate_consumed_line(
        order: &mut ManufacturingOrder,
        move_id: Uuid,
        mut qty_to_add: Decimal,
        final_identity: Option<&Identity>,
        lot: Option<&Identity>,
        precision: &QuantityPrecision,
    ) -> Result<()> {
        let stock_move = order
            .raw_move(move_id)
            .cloned()
            .ok_or_else(|| MesError::MoveNotFound(move_id.to_string()))?;

        let candidates: Vec<Uuid> = order
            .lines_of_move(move_id)
            .filter(|l| l.identity.as_ref() == lot && l.produced_identity.is_none())
            .map(|l| l.id)
            .collect();

        for line_id in candidates {
            if !precision.is_positive(qty_to_add) {
                break;
            }

            let mut split = None;
            {
                let line = order.line_mut(line_id)?;
                let available = line.reserved_qty - line.qty_done;
                if !precision.is_positive(available) {
                    continue;
                }

                let taken = qty_to_add.min(available);
                qty_to_add -= taken;
                let new_done = line.qty_done + taken;

                if precision.gte(new_done, line.reserved_qty) {
                    line.qty_done = new_done;
                    line.produced_identity = final_identity.cloned();
                } else {
                    // 部分耗用：已耗用的部分拆成新明細，原明細保留剩餘預留量
                    let mut consumed = line.clone();
                    consumed.id = Uuid::new_v4();
                    consumed.reserved_qty = new_done;
                    consumed.qty_done = new_done;
                    consumed.produced_identity = final_identity.cloned();

                    line.reserved_qty -= new_done;
                    line.qty_done = Decimal::ZERO;
                    split = Some(consumed);
                }
            }
            if let Some(consumed) = split {
                order.move_lines.push(consumed);
            }
        }

        if precision.is_positive(qty_to_add) {
            let mut line = MoveLine::for_move(&stock_move, qty_to_add).with_identity(lot.cloned());
            line.produced_identity = final_identity.cloned();
            order.move_lines.push(line);
        }

        tracing::debug!(
            "元件 {} 耗用已歸屬到成品批號 {:?}",
            stock_move.product.id,
            final_identity
        );
        Ok(())
    }

    /// 直接累加移動的完成數量（單一明細時加在該明細上，沒有明細時新增一筆）
    pub fn increment_quantity_done(
        order: &mut ManufacturingOrder,
        move_id: Uuid,
        qty: Decimal,
    ) -> Result<()> {
        if let Some(line) = order.move_lines.iter_mut().find(|l| l.move_id == move_id) {
            line.qty_done += qty;
            return Ok(());
        }

        let stock_move = order
            .find_move(move_id)
            .ok_or_else(|| MesError::MoveNotFound(move_id.to_string()))?;
        let line = MoveLine::for_move(stock_move, qty);
        order.move_lines.push(line);
        Ok(())
    }

    /// 增加移動的完成數量：先填滿既有明細的預留量，剩餘的建立新明細
    pub fn add_quantity_done(
        order: &mut ManufacturingOrder,
        move_id: Uuid,
        mut qty: Decimal,
        precision: &QuantityPrecision,
    ) -> Result<()> {
        let stock_move = order
            .find_move(move_id)
            .cloned()
            .ok_or_else(|| MesError::MoveNotFound(move_id.to_string()))?;

        for line in order
            .move_lines
            .iter_mut()
            .filter(|l| l.move_id == move_id)
        {
            if !precision.is_positive(qty) {
                break;
            }
            let available = line.reserved_qty - line.qty_done;
            if !precision.is_positive(available) {
                continue;
            }
            let taken = qty.min(available);
            line.qty_done += taken;
            qty -= taken;
        }

        if precision.is_positive(qty) {
            order.move_lines.push(MoveLine::for_move(&stock_move, qty));
        }
        Ok(())
    }

    /// 檢查工單的追蹤元件暫存明細都已填入批號/序號
    ///
    /// 在報工任何異動之前呼叫；數量 ≤ 0 的明細之後會被刪除，不檢查。
    pub fn ensure_component_identities(order: &ManufacturingOrder, index: usize) -> Result<()> {
        let missing = order
            .find_lines(&MoveLineFilter::new().work_order(index).temporary(true))
            .into_iter()
            .filter(|l| order.raw_move(l.move_id).is_some())
            .find(|l| l.qty_done > Decimal::ZERO && l.tracking.is_tracked() && l.identity.is_none());

        match missing {
            Some(line) => Err(MesError::MissingIdentity(format!(
                "元件 {} 需要批號/序號",
                line.product_id
            ))),
            None => Ok(()),
        }
    }

    /// 處理工單的暫存明細
    ///
    /// - 數量 ≤ 0 的明細視為捨入雜訊，直接刪除
    /// - 追蹤元件缺少批號時回傳 `MissingIdentity`
    /// - 有相同產品 + 批號、尚未歸屬的正式明細時合併進去，否則轉為正式明細
    /// - 最後把剩餘未歸屬的正式明細全部歸屬到成品批號
    pub fn reconcile_active_lines(
        order: &mut ManufacturingOrder,
        index: usize,
        final_identity: Option<&Identity>,
        producing: Decimal,
    ) -> Result<()> {
        let raw_move_ids: Vec<Uuid> = order.raw_moves.iter().map(|m| m.id).collect();
        let active: Vec<MoveLine> = order
            .find_lines(&MoveLineFilter::new().work_order(index).temporary(true))
            .into_iter()
            .filter(|l| raw_move_ids.contains(&l.move_id))
            .cloned()
            .collect();

        for line in active {
            if line.qty_done <= Decimal::ZERO {
                tracing::warn!(
                    "刪除數量為 {} 的暫存明細（元件 {}）",
                    line.qty_done,
                    line.product_id
                );
                order.remove_line(line.id);
                continue;
            }

            if line.tracking.is_tracked() && line.identity.is_none() {
                return Err(MesError::MissingIdentity(format!(
                    "元件 {} 需要批號/序號",
                    line.product_id
                )));
            }

            let target = order.move_lines.iter_mut().find(|l| {
                l.id != line.id
                    && l.work_order == Some(index)
                    && !l.is_temporary()
                    && l.produced_identity.is_none()
                    && l.product_id == line.product_id
                    && l.identity == line.identity
            });

            match target {
                Some(existing) => {
                    existing.qty_done += line.qty_done;
                    existing.produced_identity = final_identity.cloned();
                    tracing::debug!(
                        "暫存明細 {} 合併到 {}（元件 {}，批號 {:?}）",
                        line.id,
                        existing.id,
                        line.product_id,
                        line.identity
                    );
                    order.remove_line(line.id);
                }
                None => {
                    let current = order.line_mut(line.id)?;
                    current.produced_identity = final_identity.cloned();
                    current.done_wo = true;
                }
            }
        }

        for line in order.move_lines.iter_mut().filter(|l| {
            l.work_order == Some(index)
                && raw_move_ids.contains(&l.move_id)
                && !l.is_temporary()
                && l.produced_identity.is_none()
                && l.qty_done > Decimal::ZERO
        }) {
            line.produced_identity = final_identity.cloned();
            line.produced_identity_qty = producing;
        }

        Ok(())
    }

    /// 過帳成品產出
    ///
    /// 追蹤成品依批號找到（或建立）明細並累加；不追蹤時直接增加移動的完成數量。
    pub fn post_finished_product(
        order: &mut ManufacturingOrder,
        index: usize,
        final_identity: Option<&Identity>,
        producing: Decimal,
        putaway: &dyn PutawayService,
        precision: &QuantityPrecision,
    ) -> Result<()> {
        let Some(finished) = order.main_finished_move().cloned() else {
            tracing::debug!("製令 {} 沒有未結案的成品移動", order.name);
            return Ok(());
        };

        if !finished.tracking().is_tracked() {
            return Self::add_quantity_done(order, finished.id, producing, precision);
        }

        let existing = order
            .move_lines
            .iter_mut()
            .find(|l| l.move_id == finished.id && l.identity.as_ref() == final_identity);

        match existing {
            Some(line) => {
                line.reserved_qty += producing;
                line.qty_done += producing;
            }
            None => {
                let location_dest =
                    putaway.resolve_putaway_location(&finished.location_dest, &finished.product);
                let mut line = MoveLine::for_move(&finished, producing)
                    .with_identity(final_identity.cloned())
                    .with_reserved(producing)
                    .with_location_dest(location_dest);
                line.work_order = Some(index);
                order.move_lines.push(line);
            }
        }

        tracing::debug!(
            "成品 {} 產出 {}（批號 {:?}）",
            finished.product.id,
            producing,
            final_identity
        );
        Ok(())
    }

    /// 產生副產品明細；序號追蹤的副產品每件一筆
    pub fn emit_byproducts(
        order: &mut ManufacturingOrder,
        index: usize,
        producing: Decimal,
        putaway: &dyn PutawayService,
        uom: &dyn UomService,
    ) -> Result<usize> {
        let byproducts: Vec<_> = order.byproduct_moves().into_iter().cloned().collect();
        let mut created = 0;

        for stock_move in byproducts {
            let precision = uom.rounding_precision(&stock_move.uom);
            let qty = precision.round(producing * stock_move.unit_factor);
            let location_dest =
                putaway.resolve_putaway_location(&stock_move.location_dest, &stock_move.product);

            let (units, unit_qty) = if stock_move.tracking() == Tracking::Serial {
                let converted = uom.convert_quantity(qty, &stock_move.uom, &stock_move.product.uom)?;
                let count = uom
                    .rounding_precision(&stock_move.product.uom)
                    .round(converted)
                    .ceil()
                    .to_usize()
                    .unwrap_or(0);
                (count, Decimal::ONE)
            } else if qty > Decimal::ZERO {
                (1, qty)
            } else {
                (0, Decimal::ZERO)
            };

            for _ in 0..units {
                let mut line = MoveLine::for_move(&stock_move, unit_qty)
                    .with_reserved(unit_qty)
                    .with_location_dest(location_dest.clone());
                line.work_order = Some(index);
                order.move_lines.push(line);
            }

            tracing::debug!(
                "副產品 {} 產生 {} 筆明細",
                stock_move.product.id,
                units
            );
            created += units;
        }

        Ok(created)
    }

    /// 確認工單的暫存明細（完工時呼叫）
    ///
    /// 數量 ≤ 0 或缺少批號的追蹤佔位明細會被刪除，其餘轉為正式明細。
    pub fn finalize_temporary_lines(order: &mut ManufacturingOrder, index: usize) -> usize {
        let before = order.move_lines.len();
        order.move_lines.retain(|l| {
            !(l.work_order == Some(index)
                && l.is_temporary()
                && (l.qty_done <= Decimal::ZERO || (l.tracking.is_tracked() && l.identity.is_none())))
        });
        let removed = before - order.move_lines.len();

        let mut finalized = 0;
        for line in order
            .move_lines
            .iter_mut()
            .filter(|l| l.work_order == Some(index) && l.is_temporary())
        {
            line.done_wo = true;
            finalized += 1;
        }

        if removed > 0 || finalized > 0 {
            tracing::debug!(
                "工單 #{} 暫存明細：刪除 {} 筆，確認 {} 筆",
                index,
                removed,
                finalized
            );
        }
        finalized
    }
}
