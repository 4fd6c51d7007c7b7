//! 工單模型

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BatchMode, Identity, MesError, Operation, QuantityPrecision, Result};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderState {
    /// 等待前站
    Pending,
    /// 可開工
    Ready,
    /// 生產中
    InProgress,
    /// 已完工
    Done,
    /// 已取消
    Cancel,
}

impl WorkOrderState {
    /// 終態（完工或取消）
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderState::Done | WorkOrderState::Cancel)
    }

    /// 可以報工的狀態
    pub fn is_actionable(&self) -> bool {
        matches!(self, WorkOrderState::Ready | WorkOrderState::InProgress)
    }
}

impl fmt::Display for WorkOrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOrderState::Pending => write!(f, "pending"),
            WorkOrderState::Ready => write!(f, "ready"),
            WorkOrderState::InProgress => write!(f, "in_progress"),
            WorkOrderState::Done => write!(f, "done"),
            WorkOrderState::Cancel => write!(f, "cancel"),
        }
    }
}

/// 工時紀錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLog {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TimeLog {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// 工單（製程路線中的一站）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    /// 工單ID
    pub id: Uuid,

    /// 作業名稱
    pub name: String,

    /// 作業ID
    pub operation_id: String,

    /// 工作中心ID
    pub workcenter_id: String,

    /// 狀態
    pub state: WorkOrderState,

    /// 本站目標數量
    pub quantity_to_produce: Decimal,

    /// 累計完成數量
    pub quantity_produced: Decimal,

    /// 本次報工數量（每次報工後重新計算）
    pub quantity_producing: Decimal,

    /// 每週期產能
    pub capacity: Decimal,

    /// 預計工時（分鐘）
    pub duration_expected: Decimal,

    /// 本次生產中成品的批號/序號
    pub final_identity: Option<Identity>,

    /// 下一站工單（製令內的索引）
    pub next_work_order: Option<usize>,

    /// 批次模式
    pub batch: BatchMode,

    pub date_started: Option<DateTime<Utc>>,
    pub date_finished: Option<DateTime<Utc>>,

    /// 工時紀錄
    pub time_logs: Vec<TimeLog>,
}

impl WorkOrder {
    /// 依作業創建新的工單
    pub fn from_operation(
        operation: &Operation,
        state: WorkOrderState,
        quantity: Decimal,
        duration_expected: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: operation.name.clone(),
            operation_id: operation.id.clone(),
            workcenter_id: operation.workcenter.id.clone(),
            state,
            quantity_to_produce: quantity,
            quantity_produced: Decimal::ZERO,
            quantity_producing: quantity,
            capacity: operation.workcenter.capacity,
            duration_expected,
            final_identity: None,
            next_work_order: None,
            batch: operation.batch,
            date_started: None,
            date_finished: None,
            time_logs: Vec::new(),
        }
    }

    /// 剩餘數量
    pub fn remaining(&self, precision: &QuantityPrecision) -> Decimal {
        precision.round(self.quantity_to_produce - self.quantity_produced)
    }

    /// 是否已達目標數量
    pub fn is_fully_produced(&self, precision: &QuantityPrecision) -> bool {
        precision.gte(self.quantity_produced, self.quantity_to_produce)
    }

    /// 檢查狀態，不符時回傳 `InvalidState`
    pub fn ensure_actionable(&self, action: &'static str) -> Result<()> {
        if self.state.is_actionable() {
            Ok(())
        } else {
            Err(MesError::InvalidState {
                work_order: self.name.clone(),
                state: self.state,
                action,
            })
        }
    }

    /// 開啟工時紀錄
    pub fn open_time_log(&mut self, now: DateTime<Utc>) {
        if !self.time_logs.iter().any(TimeLog::is_open) {
            self.time_logs.push(TimeLog {
                started_at: now,
                ended_at: None,
            });
        }
    }

    /// 結束所有未關閉的工時紀錄，回傳關閉筆數
    pub fn close_time_logs(&mut self, now: DateTime<Utc>) -> usize {
        let mut closed = 0;
        for log in self.time_logs.iter_mut().filter(|log| log.is_open()) {
            log.ended_at = Some(now);
            closed += 1;
        }
        closed
    }

    /// 已結束工時的總分鐘數
    pub fn duration_minutes(&self) -> i64 {
        self.time_logs
            .iter()
            .filter_map(|log| log.ended_at.map(|end| (end - log.started_at).num_minutes()))
            .sum()
    }
}
