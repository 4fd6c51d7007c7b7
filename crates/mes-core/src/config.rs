//! 工單執行引擎配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MesError, Result};

/// 工單執行引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 自動配發批號/序號的前綴
    pub identity_prefix: String,

    /// 流水號位數
    pub identity_padding: usize,

    /// 建立工單鏈時，是否為第一站預先配發成品批號/序號
    ///
    /// - true: 操作員可直接報工（預設）
    /// - false: 報工前必須手動輸入成品批號/序號
    pub auto_assign_final_identity: bool,

    /// 單位捨入值無效（≤ 0）時使用的捨入值
    pub fallback_rounding: Decimal,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            identity_prefix: "LOT-".to_string(),
            identity_padding: 5,
            auto_assign_final_identity: true,
            fallback_rounding: Decimal::new(1, 2),
        }
    }

    /// 從 JSON 載入配置（未提供的欄位使用預設值）
    ///
    /// # 範例
    /// ```
    /// # use mes_core::EngineConfig;
    /// let config = EngineConfig::from_json(r#"{ "identity_prefix": "SN-" }"#).unwrap();
    /// assert_eq!(config.identity_prefix, "SN-");
    /// assert!(config.auto_assign_final_identity);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置批號前綴
    pub fn with_identity_prefix(mut self, prefix: String) -> Self {
        self.identity_prefix = prefix;
        self
    }

    /// 建構器模式：設置流水號位數
    pub fn with_identity_padding(mut self, padding: usize) -> Self {
        self.identity_padding = padding;
        self
    }

    /// 建構器模式：設置是否自動配發成品批號/序號
    pub fn with_auto_assign_final_identity(mut self, auto: bool) -> Self {
        self.auto_assign_final_identity = auto;
        self
    }

    /// 建構器模式：設置備用捨入值
    pub fn with_fallback_rounding(mut self, rounding: Decimal) -> Self {
        self.fallback_rounding = rounding;
        self
    }

    /// 檢查配置
    pub fn validate(&self) -> Result<()> {
        if self.fallback_rounding <= Decimal::ZERO {
            return Err(MesError::Config(format!(
                "備用捨入值必須大於零: {}",
                self.fallback_rounding
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
