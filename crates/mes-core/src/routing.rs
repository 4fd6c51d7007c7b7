//! 製程路線模型（已解析的作業序列）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 工作中心
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workcenter {
    /// 工作中心ID
    pub id: String,

    /// 名稱
    pub name: String,

    /// 每個週期可處理的數量
    pub capacity: Decimal,

    /// 準備時間（分鐘）
    pub time_start: Decimal,

    /// 收尾時間（分鐘）
    pub time_stop: Decimal,

    /// 時間效率（百分比，100 = 標準）
    pub time_efficiency: Decimal,
}

impl Workcenter {
    /// 創建新的工作中心（產能 1、效率 100%、無準備/收尾時間）
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            capacity: Decimal::ONE,
            time_start: Decimal::ZERO,
            time_stop: Decimal::ZERO,
            time_efficiency: Decimal::from(100),
        }
    }

    /// 建構器模式：設置產能
    pub fn with_capacity(mut self, capacity: Decimal) -> Self {
        self.capacity = capacity;
        self
    }

    /// 建構器模式：設置準備與收尾時間
    pub fn with_setup_times(mut self, time_start: Decimal, time_stop: Decimal) -> Self {
        self.time_start = time_start;
        self.time_stop = time_stop;
        self
    }

    /// 建構器模式：設置時間效率
    pub fn with_time_efficiency(mut self, efficiency: Decimal) -> Self {
        self.time_efficiency = efficiency;
        self
    }
}

/// 批次模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchMode {
    /// 前站全部完成後才啟動下一站
    None,
    /// 前站累計完成 `size` 後即可啟動下一站
    Batch { size: Decimal },
}

/// 作業
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// 作業ID
    pub id: String,

    /// 作業名稱
    pub name: String,

    /// 所屬工作中心
    pub workcenter: Workcenter,

    /// 每週期時間（分鐘）
    pub time_cycle: Decimal,

    /// 批次模式
    pub batch: BatchMode,
}

impl Operation {
    /// 創建新的作業
    pub fn new(id: String, name: String, workcenter: Workcenter) -> Self {
        Self {
            id,
            name,
            workcenter,
            time_cycle: Decimal::from(60),
            batch: BatchMode::None,
        }
    }

    /// 建構器模式：設置每週期時間
    pub fn with_time_cycle(mut self, minutes: Decimal) -> Self {
        self.time_cycle = minutes;
        self
    }

    /// 建構器模式：設置批次大小
    pub fn with_batch_size(mut self, size: Decimal) -> Self {
        self.batch = BatchMode::Batch { size };
        self
    }
}

/// 製程路線
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routing {
    /// 路線ID
    pub id: String,

    /// 依順序排列的作業
    pub operations: Vec<Operation>,
}

impl Routing {
    pub fn new(id: String) -> Self {
        Self {
            id,
            operations: Vec::new(),
        }
    }

    /// 建構器模式：追加作業
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
