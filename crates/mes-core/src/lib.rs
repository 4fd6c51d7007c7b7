//! # MES Core
//!
//! 工單執行的核心資料模型與類型定義

pub mod config;
pub mod order;
pub mod product;
pub mod quantity;
pub mod routing;
pub mod services;
pub mod stock_move;
pub mod store;
pub mod uom;
pub mod work_order;

// Re-export 主要類型
pub use config::EngineConfig;
pub use order::{IdentityHint, ManufacturingOrder, OrderRecord, OutboundTransfer, TransferMove};
pub use product::{Identity, Product, Tracking};
pub use quantity::QuantityPrecision;
pub use routing::{BatchMode, Operation, Routing, Workcenter};
pub use services::{
    IdentityService, ManualIdentityService, PutawayRules, PutawayService, SequenceIdentityService,
};
pub use stock_move::{MoveLine, MoveLineFilter, MoveState, StockMove};
pub use store::LedgerStore;
pub use uom::{StandardUomService, UnitOfMeasure, UomService};
pub use work_order::{TimeLog, WorkOrder, WorkOrderState};

use rust_decimal::Decimal;
use uuid::Uuid;

/// 工單執行錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum MesError {
    /// 需要操作員輸入批號/序號（成品或元件）
    #[error("缺少批號/序號: {0}")]
    MissingIdentity(String),

    #[error("工單 {work_order} 狀態為 {state}，無法執行 {action}")]
    InvalidState {
        work_order: String,
        state: WorkOrderState,
        action: &'static str,
    },

    #[error("製令 {0} 的製程路線沒有任何作業")]
    EmptyRouting(String),

    #[error("製令 {0} 已建立工單鏈")]
    ChainAlreadyCreated(String),

    #[error("工作中心參數無效: {0}")]
    InvalidWorkcenter(String),

    #[error("生產數量 {requested} 超過工單 {work_order} 的剩餘數量 {remaining}")]
    QuantityExceedsRemaining {
        work_order: String,
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("無效的數量: {0}")]
    InvalidQuantity(String),

    #[error("單位類別不一致: {from} ({from_category}) → {to} ({to_category})")]
    UomCategoryMismatch {
        from: String,
        from_category: String,
        to: String,
        to_category: String,
    },

    #[error("找不到製令: {0}")]
    OrderNotFound(Uuid),

    #[error("找不到工單: #{0}")]
    WorkOrderNotFound(usize),

    #[error("找不到庫存移動: {0}")]
    MoveNotFound(String),

    #[error("找不到移動明細: {0}")]
    MoveLineNotFound(Uuid),

    #[error("移動明細 {0} 已確認，不能再修改")]
    LineFinalized(Uuid),

    #[error("帳本錯誤: {0}")]
    Ledger(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MesError>;
