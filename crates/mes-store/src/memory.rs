//! 記憶體帳本

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use mes_core::{
    LedgerStore, ManufacturingOrder, MesError, OrderRecord, OutboundTransfer, Result,
};
use uuid::Uuid;

use crate::DirtyTracker;

/// 記憶體帳本
///
/// 每張製令一把鎖：同一張製令的交易依序執行，不同製令可以並行。
/// 交易在副本上執行，只有成功時才寫回。
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    orders: DashMap<Uuid, Arc<Mutex<OrderRecord>>>,
    dirty: Mutex<DirtyTracker>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 製令數量
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// 取出並清除已提交、尚未持久化的製令ID
    pub fn take_dirty(&self) -> Result<Vec<Uuid>> {
        let mut dirty = self
            .dirty
            .lock()
            .map_err(|_| MesError::Ledger("異動追蹤鎖已損毀".to_string()))?;
        Ok(dirty.take())
    }

    fn slot(&self, order_id: Uuid) -> Result<Arc<Mutex<OrderRecord>>> {
        self.orders
            .get(&order_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(MesError::OrderNotFound(order_id))
    }

    fn mark_dirty(&self, order_id: Uuid) -> Result<()> {
        self.dirty
            .lock()
            .map_err(|_| MesError::Ledger("異動追蹤鎖已損毀".to_string()))?
            .mark_dirty(order_id);
        Ok(())
    }

    fn with_record<T>(&self, order_id: Uuid, f: impl FnOnce(&mut OrderRecord) -> T) -> Result<T> {
        let slot = self.slot(order_id)?;
        let mut record = slot
            .lock()
            .map_err(|_| MesError::Ledger(format!("製令 {} 的鎖已損毀", order_id)))?;
        Ok(f(&mut *record))
    }
}

impl LedgerStore for InMemoryLedger {
    fn insert_order(&self, order: ManufacturingOrder) -> Result<()> {
        let order_id = order.id;
        if self.orders.contains_key(&order_id) {
            return Err(MesError::Ledger(format!("製令 {} 已存在", order.name)));
        }

        tracing::debug!("帳本新增製令 {}", order.name);
        self.orders
            .insert(order_id, Arc::new(Mutex::new(OrderRecord::new(order))));
        self.mark_dirty(order_id)
    }

    fn load_order(&self, order_id: Uuid) -> Result<ManufacturingOrder> {
        self.with_record(order_id, |record| record.order.clone())
    }

    fn attach_transfer(&self, transfer: OutboundTransfer) -> Result<()> {
        let order_id = transfer.origin_order_id;
        self.with_record(order_id, |record| record.transfers.push(transfer))?;
        self.mark_dirty(order_id)
    }

    fn transfers_for(&self, order_id: Uuid) -> Result<Vec<OutboundTransfer>> {
        self.with_record(order_id, |record| record.transfers.clone())
    }

    fn transaction<T, F>(&self, order_id: Uuid, f: F) -> Result<T>
    where
        F: FnOnce(&mut OrderRecord) -> Result<T>,
    {
        let slot = self.slot(order_id)?;
        let mut record = slot
            .lock()
            .map_err(|_| MesError::Ledger(format!("製令 {} 的鎖已損毀", order_id)))?;

        let mut working = (*record).clone();
        match f(&mut working) {
            Ok(value) => {
                *record = working;
                drop(record);
                self.mark_dirty(order_id)?;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("製令 {} 交易回滾: {}", order_id, e);
                Err(e)
            }
        }
    }
}
