//! 外部協作服務：批號/序號配發與上架庫位

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{EngineConfig, Identity, Product};

/// 批號/序號配發服務
pub trait IdentityService: Send + Sync {
    /// 為產品提供預設的批號/序號；None 表示需由操作員輸入
    fn default_identity_for(&self, product: &Product) -> Option<Identity>;
}

/// 依序號規則自動配發（前綴 + 產品ID + 流水號）
#[derive(Debug)]
pub struct SequenceIdentityService {
    prefix: String,
    padding: usize,
    next: AtomicU64,
}

impl SequenceIdentityService {
    pub fn new(prefix: String, padding: usize) -> Self {
        Self {
            prefix,
            padding,
            next: AtomicU64::new(1),
        }
    }

    /// 依引擎配置創建
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.identity_prefix.clone(), config.identity_padding)
    }
}

impl IdentityService for SequenceIdentityService {
    fn default_identity_for(&self, product: &Product) -> Option<Identity> {
        let number = self.next.fetch_add(1, Ordering::Relaxed);
        Some(Identity::new(format!(
            "{}{}-{:0width$}",
            self.prefix,
            product.id,
            number,
            width = self.padding
        )))
    }
}

/// 不自動配發，所有批號/序號由操作員輸入
#[derive(Debug, Default)]
pub struct ManualIdentityService;

impl IdentityService for ManualIdentityService {
    fn default_identity_for(&self, _product: &Product) -> Option<Identity> {
        None
    }
}

/// 上架庫位解析服務
pub trait PutawayService: Send + Sync {
    fn resolve_putaway_location(&self, base_location: &str, product: &Product) -> String;
}

/// 依產品設定的上架規則
#[derive(Debug, Clone, Default)]
pub struct PutawayRules {
    /// (基礎庫位, 產品ID) → 上架庫位
    rules: HashMap<(String, String), String>,
}

impl PutawayRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：新增上架規則
    pub fn with_rule(mut self, base_location: String, product_id: String, target: String) -> Self {
        self.rules.insert((base_location, product_id), target);
        self
    }
}

impl PutawayService for PutawayRules {
    fn resolve_putaway_location(&self, base_location: &str, product: &Product) -> String {
        self.rules
            .get(&(base_location.to_string(), product.id.clone()))
            .cloned()
            .unwrap_or_else(|| base_location.to_string())
    }
}
