//! 製令模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Identity, MesError, MoveLine, MoveLineFilter, Product, Result, StockMove, UnitOfMeasure,
    WorkOrder,
};

/// 批號/序號交接提示：該批號下一次應由哪張工單使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHint {
    pub identity: Identity,
    pub work_order: usize,
}

/// 製令
///
/// 製令擁有所有工單、庫存移動與移動明細；工單之間以索引互相參照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    /// 製令ID
    pub id: Uuid,

    /// 製令編號
    pub name: String,

    /// 成品
    pub product: Product,

    /// 目標數量
    pub product_qty: Decimal,

    /// 製令單位
    pub uom: UnitOfMeasure,

    /// 工單（依製程順序）
    pub work_orders: Vec<WorkOrder>,

    /// 原料移動
    pub raw_moves: Vec<StockMove>,

    /// 成品與副產品移動
    pub finished_moves: Vec<StockMove>,

    /// 所有移動明細
    pub move_lines: Vec<MoveLine>,

    /// 批號/序號交接提示（先進先出）
    pub identity_hints: Vec<IdentityHint>,
}

impl ManufacturingOrder {
    /// 創建新的製令，並建立成品移動
    pub fn new(name: String, product: Product, product_qty: Decimal) -> Self {
        let uom = product.uom.clone();
        let finished = StockMove::new(product.clone(), product_qty, Decimal::ONE)
            .with_locations("Virtual/Production".to_string(), "WH/Stock".to_string());
        Self {
            id: Uuid::new_v4(),
            name,
            product,
            product_qty,
            uom,
            work_orders: Vec::new(),
            raw_moves: Vec::new(),
            finished_moves: vec![finished],
            move_lines: Vec::new(),
            identity_hints: Vec::new(),
        }
    }

    /// 建構器模式：設置製令單位
    pub fn with_uom(mut self, uom: UnitOfMeasure) -> Self {
        for stock_move in &mut self.finished_moves {
            if stock_move.product.id == self.product.id {
                stock_move.uom = uom.clone();
            }
        }
        self.uom = uom;
        self
    }

    /// 建構器模式：新增原料移動
    pub fn with_raw_move(mut self, stock_move: StockMove) -> Self {
        self.raw_moves.push(stock_move);
        self
    }

    /// 建構器模式：新增副產品移動
    pub fn with_byproduct_move(mut self, stock_move: StockMove) -> Self {
        let stock_move =
            stock_move.with_locations("Virtual/Production".to_string(), "WH/Stock".to_string());
        self.finished_moves.push(stock_move);
        self
    }

    pub fn work_order(&self, index: usize) -> Result<&WorkOrder> {
        self.work_orders
            .get(index)
            .ok_or(MesError::WorkOrderNotFound(index))
    }

    pub fn work_order_mut(&mut self, index: usize) -> Result<&mut WorkOrder> {
        self.work_orders
            .get_mut(index)
            .ok_or(MesError::WorkOrderNotFound(index))
    }

    /// 前一站工單
    pub fn predecessor(&self, index: usize) -> Option<usize> {
        self.work_orders
            .iter()
            .position(|wo| wo.next_work_order == Some(index))
    }

    /// 所有前站（由近到遠）
    pub fn predecessors(&self, index: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = index;
        while let Some(previous) = self.predecessor(current) {
            if chain.contains(&previous) {
                break;
            }
            chain.push(previous);
            current = previous;
        }
        chain
    }

    /// 指派給工單的原料移動索引
    pub fn raw_moves_of(&self, work_order: usize) -> Vec<usize> {
        self.raw_moves
            .iter()
            .enumerate()
            .filter(|(_, m)| m.work_order == Some(work_order))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn raw_move(&self, move_id: Uuid) -> Option<&StockMove> {
        self.raw_moves.iter().find(|m| m.id == move_id)
    }

    pub fn find_move(&self, move_id: Uuid) -> Option<&StockMove> {
        self.raw_moves
            .iter()
            .chain(self.finished_moves.iter())
            .find(|m| m.id == move_id)
    }

    /// 未結案的成品移動
    pub fn main_finished_move(&self) -> Option<&StockMove> {
        self.finished_moves
            .iter()
            .find(|m| m.product.id == self.product.id && m.is_open())
    }

    /// 未結案的副產品移動
    pub fn byproduct_moves(&self) -> Vec<&StockMove> {
        self.finished_moves
            .iter()
            .filter(|m| m.product.id != self.product.id && m.is_open())
            .collect()
    }

    pub fn lines_of_move(&self, move_id: Uuid) -> impl Iterator<Item = &MoveLine> {
        self.move_lines.iter().filter(move |l| l.move_id == move_id)
    }

    /// 移動是否有暫存明細（操作員已手動登錄耗用）
    pub fn has_temporary_lines(&self, move_id: Uuid) -> bool {
        self.lines_of_move(move_id).any(MoveLine::is_temporary)
    }

    /// 移動的完成數量
    pub fn quantity_done(&self, move_id: Uuid) -> Decimal {
        self.lines_of_move(move_id).map(|l| l.qty_done).sum()
    }

    /// 成品已完成數量
    pub fn finished_quantity(&self) -> Decimal {
        self.finished_moves
            .iter()
            .filter(|m| m.product.id == self.product.id)
            .map(|m| self.quantity_done(m.id))
            .sum()
    }

    /// 依條件查詢移動明細
    pub fn find_lines(&self, filter: &MoveLineFilter) -> Vec<&MoveLine> {
        self.move_lines.iter().filter(|l| filter.matches(l)).collect()
    }

    pub fn line_mut(&mut self, line_id: Uuid) -> Result<&mut MoveLine> {
        self.move_lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or(MesError::MoveLineNotFound(line_id))
    }

    pub fn remove_line(&mut self, line_id: Uuid) {
        self.move_lines.retain(|l| l.id != line_id);
    }

    /// 將批號/序號交接給下一站（None 表示清除提示）
    pub fn hand_off_identity(&mut self, identity: &Identity, next: Option<usize>) {
        self.identity_hints.retain(|hint| &hint.identity != identity);
        if let Some(work_order) = next {
            self.identity_hints.push(IdentityHint {
                identity: identity.clone(),
                work_order,
            });
        }
    }

    /// 最早交接給該工單的批號/序號
    pub fn hint_for(&self, work_order: usize) -> Option<&Identity> {
        self.identity_hints
            .iter()
            .find(|hint| hint.work_order == work_order)
            .map(|hint| &hint.identity)
    }
}

/// 出貨調撥單的明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMove {
    pub product_id: String,
    pub quantity: Decimal,
}

/// 由製令產生的出貨調撥單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundTransfer {
    pub id: Uuid,
    pub name: String,

    /// 來源製令
    pub origin_order_id: Uuid,

    pub moves: Vec<TransferMove>,
}

impl OutboundTransfer {
    pub fn new(name: String, origin_order_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            origin_order_id,
            moves: Vec::new(),
        }
    }

    /// 建構器模式：新增明細
    pub fn with_move(mut self, product_id: String, quantity: Decimal) -> Self {
        self.moves.push(TransferMove {
            product_id,
            quantity,
        });
        self
    }
}

/// 帳本的原子單位：製令及其出貨調撥單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order: ManufacturingOrder,
    pub transfers: Vec<OutboundTransfer>,
}

impl OrderRecord {
    pub fn new(order: ManufacturingOrder) -> Self {
        Self {
            order,
            transfers: Vec::new(),
        }
    }
}
