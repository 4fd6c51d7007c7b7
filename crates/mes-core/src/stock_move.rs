//! 庫存移動與移動明細模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Identity, Product, Tracking, UnitOfMeasure};

/// 庫存移動狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveState {
    Draft,
    Confirmed,
    Assigned,
    Done,
    Cancel,
}

impl MoveState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveState::Done | MoveState::Cancel)
    }
}

/// 庫存移動（原料耗用、成品或副產品產出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMove {
    /// 移動ID
    pub id: Uuid,

    /// 產品
    pub product: Product,

    /// 移動單位
    pub uom: UnitOfMeasure,

    /// 計劃數量
    pub planned_qty: Decimal,

    /// 每生產一單位成品需要（或產出）的數量
    pub unit_factor: Decimal,

    /// 指定的作業（None 表示由最後一站承接）
    pub operation_id: Option<String>,

    /// 所屬工單（製令內索引）
    pub work_order: Option<usize>,

    /// 是否由 BOM 展開產生
    pub from_bom: bool,

    pub state: MoveState,

    /// 來源庫位
    pub location_src: String,

    /// 目的庫位
    pub location_dest: String,
}

impl StockMove {
    /// 創建新的庫存移動
    pub fn new(product: Product, planned_qty: Decimal, unit_factor: Decimal) -> Self {
        let uom = product.uom.clone();
        Self {
            id: Uuid::new_v4(),
            product,
            uom,
            planned_qty,
            unit_factor,
            operation_id: None,
            work_order: None,
            from_bom: true,
            state: MoveState::Confirmed,
            location_src: "WH/Stock".to_string(),
            location_dest: "Virtual/Production".to_string(),
        }
    }

    /// 建構器模式：指定作業
    pub fn with_operation(mut self, operation_id: String) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// 建構器模式：設置移動單位
    pub fn with_uom(mut self, uom: UnitOfMeasure) -> Self {
        self.uom = uom;
        self
    }

    /// 建構器模式：設置庫位
    pub fn with_locations(mut self, src: String, dest: String) -> Self {
        self.location_src = src;
        self.location_dest = dest;
        self
    }

    /// 建構器模式：標記為非 BOM 展開（手動新增）
    pub fn as_manual(mut self) -> Self {
        self.from_bom = false;
        self
    }

    pub fn tracking(&self) -> Tracking {
        self.product.tracking
    }

    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }
}

/// 移動明細（實際執行的數量，可能是暫存的）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveLine {
    /// 明細ID
    pub id: Uuid,

    /// 所屬移動
    pub move_id: Uuid,

    /// 產品ID
    pub product_id: String,

    /// 產品追蹤方式
    pub tracking: Tracking,

    /// 批號/序號
    pub identity: Option<Identity>,

    /// 預留數量
    pub reserved_qty: Decimal,

    /// 完成數量
    pub qty_done: Decimal,

    /// 工單層級已確認（false 表示本次報工的暫存明細）
    pub done_wo: bool,

    /// 歸屬的成品批號/序號
    pub produced_identity: Option<Identity>,

    /// 歸屬時的成品數量
    pub produced_identity_qty: Decimal,

    /// 所屬工單（製令內索引）
    pub work_order: Option<usize>,

    pub location_src: String,
    pub location_dest: String,
}

impl MoveLine {
    /// 為庫存移動創建一筆已確認的明細
    pub fn for_move(stock_move: &StockMove, qty_done: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            move_id: stock_move.id,
            product_id: stock_move.product.id.clone(),
            tracking: stock_move.product.tracking,
            identity: None,
            reserved_qty: Decimal::ZERO,
            qty_done,
            done_wo: true,
            produced_identity: None,
            produced_identity_qty: Decimal::ZERO,
            work_order: stock_move.work_order,
            location_src: stock_move.location_src.clone(),
            location_dest: stock_move.location_dest.clone(),
        }
    }

    /// 建構器模式：設置批號/序號
    pub fn with_identity(mut self, identity: Option<Identity>) -> Self {
        self.identity = identity;
        self
    }

    /// 建構器模式：設置預留數量
    pub fn with_reserved(mut self, reserved_qty: Decimal) -> Self {
        self.reserved_qty = reserved_qty;
        self
    }

    /// 建構器模式：標記為暫存明細（本次報工中）
    pub fn as_temporary(mut self) -> Self {
        self.done_wo = false;
        self
    }

    /// 建構器模式：設置目的庫位
    pub fn with_location_dest(mut self, location_dest: String) -> Self {
        self.location_dest = location_dest;
        self
    }

    pub fn is_temporary(&self) -> bool {
        !self.done_wo
    }
}

/// 移動明細查詢條件
#[derive(Debug, Clone, Default)]
pub struct MoveLineFilter {
    pub product_id: Option<String>,
    /// `Some(None)` 表示沒有批號/序號的明細
    pub identity: Option<Option<Identity>>,
    pub work_order: Option<usize>,
    pub temporary: Option<bool>,
}

impl MoveLineFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：依產品篩選
    pub fn product(mut self, product_id: &str) -> Self {
        self.product_id = Some(product_id.to_string());
        self
    }

    /// 建構器模式：依批號/序號篩選
    pub fn identity(mut self, identity: Option<&Identity>) -> Self {
        self.identity = Some(identity.cloned());
        self
    }

    /// 建構器模式：依工單篩選
    pub fn work_order(mut self, work_order: usize) -> Self {
        self.work_order = Some(work_order);
        self
    }

    /// 建構器模式：依是否暫存篩選
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = Some(temporary);
        self
    }

    pub fn matches(&self, line: &MoveLine) -> bool {
        if let Some(product_id) = &self.product_id {
            if &line.product_id != product_id {
                return false;
            }
        }
        if let Some(identity) = &self.identity {
            if &line.identity != identity {
                return false;
            }
        }
        if let Some(work_order) = self.work_order {
            if line.work_order != Some(work_order) {
                return false;
            }
        }
        if let Some(temporary) = self.temporary {
            if line.is_temporary() != temporary {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_line_filter() {
        let product = Product::new("BOLT".to_string(), "Bolt".to_string());
        let mut stock_move = StockMove::new(product, Decimal::from(20), Decimal::from(2));
        stock_move.work_order = Some(0);

        let line = MoveLine::for_move(&stock_move, Decimal::from(4))
            .with_identity(Some(Identity::new("LOT-A")))
            .as_temporary();

        assert!(MoveLineFilter::new().product("BOLT").matches(&line));
        assert!(MoveLineFilter::new().work_order(0).temporary(true).matches(&line));
        assert!(MoveLineFilter::new()
            .identity(Some(&Identity::new("LOT-A")))
            .matches(&line));
        assert!(!MoveLineFilter::new().identity(None).matches(&line));
        assert!(!MoveLineFilter::new().work_order(1).matches(&line));
        assert!(!MoveLineFilter::new().product("NUT").matches(&line));
    }
}
