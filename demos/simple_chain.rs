//! 三站製程報工示例
//!
//! 執行：`RUST_LOG=mes_exec=debug cargo run --example simple_chain`

use std::sync::Arc;

use mes::{
    EngineConfig, InMemoryLedger, LedgerStore, ManufacturingOrder, Operation, OutboundTransfer,
    Product, Routing, StockMove, WorkOrderEngine, Workcenter,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mes_exec=info")),
        )
        .init();

    println!("=== 三站製程報工示例 ===\n");

    // 1. 製令：腳踏車 10 台，每台 2 個輪子、1 個車架
    let bike = Product::new("BIKE-001".to_string(), "Bicycle".to_string());
    let wheel = Product::new("WHEEL-001".to_string(), "Wheel".to_string());
    let frame = Product::new("FRAME-001".to_string(), "Frame".to_string());
    let order = ManufacturingOrder::new("MO-2025-001".to_string(), bike, Decimal::from(10))
        .with_raw_move(
            StockMove::new(frame, Decimal::from(10), Decimal::ONE)
                .with_operation("OP-WELD".to_string()),
        )
        .with_raw_move(StockMove::new(wheel, Decimal::from(20), Decimal::from(2)));
    let order_id = order.id;

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.insert_order(order)?;
    ledger.attach_transfer(
        OutboundTransfer::new("WH/OUT/00001".to_string(), order_id)
            .with_move("BIKE-001".to_string(), Decimal::from(10)),
    )?;

    // 2. 製程路線：焊接 → 噴漆 → 組裝
    let routing = Routing::new("RT-BIKE".to_string())
        .with_operation(Operation::new(
            "OP-WELD".to_string(),
            "Welding".to_string(),
            Workcenter::new("WC-WELD".to_string(), "Welding Cell".to_string())
                .with_capacity(Decimal::from(2))
                .with_setup_times(Decimal::from(15), Decimal::from(5)),
        ))
        .with_operation(
            Operation::new(
                "OP-PAINT".to_string(),
                "Painting".to_string(),
                Workcenter::new("WC-PAINT".to_string(), "Paint Booth".to_string())
                    .with_capacity(Decimal::from(5)),
            )
            .with_time_cycle(Decimal::from(30)),
        )
        .with_operation(Operation::new(
            "OP-ASSY".to_string(),
            "Assembly".to_string(),
            Workcenter::new("WC-ASSY".to_string(), "Assembly Line".to_string())
                .with_time_efficiency(Decimal::from(120)),
        ));

    let engine = WorkOrderEngine::new(Arc::clone(&ledger), EngineConfig::default());
    let work_orders = engine.create_work_order_chain(order_id, &routing, Decimal::from(10))?;
    tracing::info!("示例製令 {} 已建立 {} 張工單", order_id, work_orders.len());

    println!("工單鏈:");
    for wo in &work_orders {
        println!(
            "  - {} [{}] 預計工時 {} 分鐘",
            wo.name, wo.state, wo.duration_expected
        );
    }

    // 3. 焊接分兩次報工：先 6 台，再提前結束
    engine.start(order_id, 0)?;
    engine.set_quantity_producing(order_id, 0, Decimal::from(6))?;
    engine.record_production(order_id, 0)?;
    engine.set_quantity_producing(order_id, 0, Decimal::ZERO)?;
    engine.record_production(order_id, 0)?;

    // 4. 其餘兩站依實際數量報工
    for index in 1..work_orders.len() {
        engine.start(order_id, index)?;
        engine.record_production(order_id, index)?;
    }

    let order = ledger.load_order(order_id)?;
    println!("\n結果:");
    for wo in &order.work_orders {
        println!(
            "  - {} [{}] 完成 {} / {}",
            wo.name, wo.state, wo.quantity_produced, wo.quantity_to_produce
        );
    }
    println!("  製令數量: {}", order.product_qty);
    println!("  成品入庫: {}", order.finished_quantity());
    for stock_move in &order.raw_moves {
        println!(
            "  耗用 {}: {}",
            stock_move.product.id,
            order.quantity_done(stock_move.id)
        );
    }
    for transfer in ledger.transfers_for(order_id)? {
        println!("  出貨單 {}: {}", transfer.name, transfer.moves[0].quantity);
    }

    Ok(())
}
