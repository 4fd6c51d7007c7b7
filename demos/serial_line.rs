//! 序號追蹤產線示例
//!
//! 執行：`RUST_LOG=debug cargo run --example serial_line`

use std::sync::Arc;

use mes::{
    EngineConfig, Identity, InMemoryLedger, LedgerStore, ManufacturingOrder, MoveLineFilter,
    Operation, Product, Routing, StockMove, Tracking, WorkOrderEngine, WorkOrderState, Workcenter,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== 序號追蹤產線示例 ===\n");

    // 控制器 3 台，每台一片批號追蹤的主板
    let controller = Product::new("CTRL-100".to_string(), "Controller".to_string())
        .with_tracking(Tracking::Serial);
    let board = Product::new("PCB-100".to_string(), "Main Board".to_string())
        .with_tracking(Tracking::Lot);
    let screw = Product::new("SCREW-M3".to_string(), "M3 Screw".to_string());
    let order = ManufacturingOrder::new("MO-2025-042".to_string(), controller, Decimal::from(3))
        .with_raw_move(
            StockMove::new(board, Decimal::from(3), Decimal::ONE)
                .with_operation("OP-SMT".to_string()),
        )
        .with_raw_move(StockMove::new(screw, Decimal::from(12), Decimal::from(4)));
    let order_id = order.id;

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.insert_order(order)?;

    let routing = Routing::new("RT-CTRL".to_string())
        .with_operation(Operation::new(
            "OP-SMT".to_string(),
            "SMT".to_string(),
            Workcenter::new("WC-SMT".to_string(), "SMT Line".to_string()),
        ))
        .with_operation(Operation::new(
            "OP-TEST".to_string(),
            "Final Test".to_string(),
            Workcenter::new("WC-TEST".to_string(), "Test Bench".to_string()),
        ));

    let config = EngineConfig::default()
        .with_identity_prefix("SN-".to_string())
        .with_identity_padding(4);
    let engine = WorkOrderEngine::new(Arc::clone(&ledger), config);
    engine.create_work_order_chain(order_id, &routing, Decimal::from(3))?;

    // SMT：每台先填入主板批號再報工
    while engine.work_order(order_id, 0)?.state != WorkOrderState::Done {
        let placeholders = ledger.find_move_lines(
            order_id,
            &MoveLineFilter::new()
                .product("PCB-100")
                .identity(None)
                .work_order(0)
                .temporary(true),
        )?;
        for line in placeholders {
            engine.assign_component_identity(order_id, line.id, Identity::new("PCB-LOT-7"), None)?;
        }

        let serial = engine.work_order(order_id, 0)?.final_identity;
        engine.record_production(order_id, 0)?;
        println!("SMT 完成序號 {:?}", serial.map(|s| s.to_string()));
    }

    // 測試站沿用 SMT 的序號
    while engine.work_order(order_id, 1)?.state != WorkOrderState::Done {
        let serial = engine.work_order(order_id, 1)?.final_identity;
        engine.record_production(order_id, 1)?;
        println!("測試完成序號 {:?}", serial.map(|s| s.to_string()));
    }

    println!("\n追溯:");
    let order = ledger.load_order(order_id)?;
    for line in order.find_lines(&MoveLineFilter::new().product("PCB-100")) {
        println!(
            "  主板 {} × {} → 控制器 {}",
            line.identity.as_ref().map(Identity::as_str).unwrap_or("-"),
            line.qty_done,
            line.produced_identity
                .as_ref()
                .map(Identity::as_str)
                .unwrap_or("-")
        );
    }
    for line in order.find_lines(&MoveLineFilter::new().product("CTRL-100")) {
        println!(
            "  入庫 {} × {}",
            line.identity.as_ref().map(Identity::as_str).unwrap_or("-"),
            line.qty_done
        );
    }

    Ok(())
}
