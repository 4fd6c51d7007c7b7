//! 產品與批號/序號模型

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::UnitOfMeasure;

/// 追蹤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tracking {
    /// 不追蹤
    None,
    /// 批號追蹤
    Lot,
    /// 序號追蹤（每件唯一）
    Serial,
}

impl Tracking {
    /// 是否需要批號/序號
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Tracking::None)
    }
}

/// 產品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// 產品ID
    pub id: String,

    /// 產品名稱
    pub name: String,

    /// 追蹤方式
    pub tracking: Tracking,

    /// 庫存單位
    pub uom: UnitOfMeasure,
}

impl Product {
    /// 創建新的產品（不追蹤、單位為「個」）
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            tracking: Tracking::None,
            uom: UnitOfMeasure::unit(),
        }
    }

    /// 建構器模式：設置追蹤方式
    pub fn with_tracking(mut self, tracking: Tracking) -> Self {
        self.tracking = tracking;
        self
    }

    /// 建構器模式：設置庫存單位
    pub fn with_uom(mut self, uom: UnitOfMeasure) -> Self {
        self.uom = uom;
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.tracking.is_tracked()
    }
}

/// 批號/序號
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
