//! 工單執行引擎
//!
//! 對外的操作入口：每個操作都在帳本的單一製令交易內執行，
//! 失敗時整筆捨棄。

use std::sync::Arc;

use chrono::Utc;
use mes_core::{
    EngineConfig, Identity, IdentityService, LedgerStore, PutawayRules, PutawayService, Result,
    Routing, SequenceIdentityService, StandardUomService, UomService, WorkOrder,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Collaborators, CompletionEngine, QuantityLedger, WorkOrderFactory};

/// 工單執行引擎
pub struct WorkOrderEngine<L: LedgerStore> {
    ledger: Arc<L>,
    config: EngineConfig,
    identities: Arc<dyn IdentityService>,
    putaway: Arc<dyn PutawayService>,
    uom: Arc<dyn UomService>,
}

impl<L: LedgerStore> WorkOrderEngine<L> {
    /// 創建新的引擎，使用預設的批號配發、上架與單位換算服務
    pub fn new(ledger: Arc<L>, config: EngineConfig) -> Self {
        let identities = Arc::new(SequenceIdentityService::from_config(&config));
        let uom = Arc::new(StandardUomService::new(config.fallback_rounding));
        Self {
            ledger,
            config,
            identities,
            putaway: Arc::new(PutawayRules::new()),
            uom,
        }
    }

    /// 建構器模式：設置批號/序號配發服務
    pub fn with_identity_service(mut self, identities: Arc<dyn IdentityService>) -> Self {
        self.identities = identities;
        self
    }

    /// 建構器模式：設置上架庫位服務
    pub fn with_putaway_service(mut self, putaway: Arc<dyn PutawayService>) -> Self {
        self.putaway = putaway;
        self
    }

    /// 建構器模式：設置單位換算服務
    pub fn with_uom_service(mut self, uom: Arc<dyn UomService>) -> Self {
        self.uom = uom;
        self
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn collaborators(&self) -> Collaborators<'_> {
        Collaborators::new(
            self.identities.as_ref(),
            self.putaway.as_ref(),
            self.uom.as_ref(),
        )
    }

    /// 為製令建立工單鏈，回傳建立的工單
    pub fn create_work_order_chain(
        &self,
        order_id: Uuid,
        routing: &Routing,
        quantity: Decimal,
    ) -> Result<Vec<WorkOrder>> {
        let services = self.collaborators();
        self.ledger.transaction(order_id, |record| {
            let created = WorkOrderFactory::create_chain(
                &mut record.order,
                routing,
                quantity,
                &services,
                &self.config,
            )?;
            Ok(created
                .into_iter()
                .map(|index| record.order.work_orders[index].clone())
                .collect())
        })
    }

    /// 記錄一次報工
    pub fn record_production(&self, order_id: Uuid, work_order: usize) -> Result<()> {
        let services = self.collaborators();
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::record_production(record, work_order, &services, Utc::now())
        })
    }

    /// 完工
    pub fn finish(&self, order_id: Uuid, work_order: usize) -> Result<()> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::finish(record, work_order, Utc::now())
        })
    }

    /// 開工
    pub fn start(&self, order_id: Uuid, work_order: usize) -> Result<()> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::start(record, work_order, Utc::now())
        })
    }

    /// 暫停
    pub fn pause(&self, order_id: Uuid, work_order: usize) -> Result<()> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::pause(record, work_order, Utc::now())
        })
    }

    /// 修改本次報工數量
    pub fn set_quantity_producing(
        &self,
        order_id: Uuid,
        work_order: usize,
        quantity: Decimal,
    ) -> Result<()> {
        let services = self.collaborators();
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::set_quantity_producing(record, work_order, quantity, &services)
        })
    }

    /// 輸入成品批號/序號
    pub fn set_final_identity(
        &self,
        order_id: Uuid,
        work_order: usize,
        identity: Identity,
    ) -> Result<()> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::set_final_identity(record, work_order, identity)
        })
    }

    /// 手動登錄元件耗用，回傳新明細ID
    pub fn log_component(
        &self,
        order_id: Uuid,
        work_order: usize,
        product_id: &str,
        identity: Option<Identity>,
        quantity: Decimal,
    ) -> Result<Uuid> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::log_component(record, work_order, product_id, identity, quantity)
        })
    }

    /// 為暫存明細填入元件批號/序號
    pub fn assign_component_identity(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        identity: Identity,
        quantity: Option<Decimal>,
    ) -> Result<()> {
        self.ledger.transaction(order_id, |record| {
            CompletionEngine::assign_component_identity(record, line_id, identity, quantity)
        })
    }

    /// 工單快照
    pub fn work_order(&self, order_id: Uuid, work_order: usize) -> Result<WorkOrder> {
        let order = self.ledger.load_order(order_id)?;
        order.work_order(work_order).cloned()
    }

    /// 工單剩餘數量
    pub fn remaining(&self, order_id: Uuid, work_order: usize) -> Result<Decimal> {
        let order = self.ledger.load_order(order_id)?;
        let ledger = QuantityLedger::for_order(&order, self.uom.as_ref());
        Ok(order.work_order(work_order)?.remaining(ledger.precision()))
    }
}
