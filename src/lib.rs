//! # MES
//!
//! 製造執行：依製程路線建立工單鏈、報工、批號/序號追溯與工單鏈推進
//!
//! ## 範例
//!
//! ```
//! use std::sync::Arc;
//!
//! use mes::{
//!     EngineConfig, InMemoryLedger, LedgerStore, ManufacturingOrder, Operation, Product,
//!     Routing, WorkOrderEngine, WorkOrderState, Workcenter,
//! };
//! use rust_decimal::Decimal;
//!
//! let ledger = Arc::new(InMemoryLedger::new());
//! let product = Product::new("BIKE".to_string(), "Bike".to_string());
//! let order = ManufacturingOrder::new("MO-001".to_string(), product, Decimal::from(5));
//! let order_id = order.id;
//! ledger.insert_order(order)?;
//!
//! let routing = Routing::new("RT-1".to_string()).with_operation(Operation::new(
//!     "OP-1".to_string(),
//!     "Assembly".to_string(),
//!     Workcenter::new("WC-1".to_string(), "Line".to_string()),
//! ));
//!
//! let engine = WorkOrderEngine::new(ledger, EngineConfig::default());
//! engine.create_work_order_chain(order_id, &routing, Decimal::from(5))?;
//! engine.record_production(order_id, 0)?;
//!
//! let wo = engine.work_order(order_id, 0)?;
//! assert_eq!(wo.quantity_produced, Decimal::from(5));
//! assert_eq!(wo.state, WorkOrderState::Done);
//! # Ok::<(), mes::MesError>(())
//! ```

pub use mes_core::*;
pub use mes_exec::{
    ChainActivator, Collaborators, CompletionEngine, IdentityReconciler, QuantityLedger,
    WorkOrderEngine, WorkOrderFactory,
};
pub use mes_store::{DirtyTracker, InMemoryLedger};
