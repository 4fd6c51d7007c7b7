//! 計量單位模型與換算服務

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MesError, QuantityPrecision, Result};

/// 計量單位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    /// 單位名稱
    pub name: String,

    /// 單位類別（同類別才能互相換算）
    pub category: String,

    /// 相對於類別參考單位的比率（參考單位 = 1）
    ///
    /// 例：參考單位為「個」時，「打」的比率為 1/12
    pub factor: Decimal,

    /// 捨入值
    pub rounding: Decimal,
}

impl UnitOfMeasure {
    /// 創建新的計量單位
    pub fn new(name: String, category: String, factor: Decimal, rounding: Decimal) -> Self {
        Self {
            name,
            category,
            factor,
            rounding,
        }
    }

    /// 預設的「個」單位（捨入值 0.01）
    pub fn unit() -> Self {
        Self::new(
            "Units".to_string(),
            "Unit".to_string(),
            Decimal::ONE,
            Decimal::new(1, 2),
        )
    }

    /// 建構器模式：設置捨入值
    pub fn with_rounding(mut self, rounding: Decimal) -> Self {
        self.rounding = rounding;
        self
    }

    /// 取得該單位的數量精度
    pub fn precision(&self) -> QuantityPrecision {
        QuantityPrecision::from_rounding(self.rounding)
    }
}

/// 單位換算服務
pub trait UomService: Send + Sync {
    /// 將數量從一個單位換算到另一個單位
    fn convert_quantity(
        &self,
        quantity: Decimal,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
    ) -> Result<Decimal>;

    /// 取得單位的捨入精度
    fn rounding_precision(&self, unit: &UnitOfMeasure) -> QuantityPrecision;
}

/// 標準單位換算（依比率換算並捨入到目標單位精度）
#[derive(Debug, Clone)]
pub struct StandardUomService {
    fallback_rounding: Decimal,
}

impl StandardUomService {
    pub fn new(fallback_rounding: Decimal) -> Self {
        Self { fallback_rounding }
    }
}

impl Default for StandardUomService {
    fn default() -> Self {
        Self::new(Decimal::new(1, 2))
    }
}

impl UomService for StandardUomService {
    fn convert_quantity(
        &self,
        quantity: Decimal,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(quantity);
        }

        if from.category != to.category {
            return Err(MesError::UomCategoryMismatch {
                from: from.name.clone(),
                from_category: from.category.clone(),
                to: to.name.clone(),
                to_category: to.category.clone(),
            });
        }

        if let Some(unit) = [from, to].into_iter().find(|u| u.factor <= Decimal::ZERO) {
            return Err(MesError::InvalidQuantity(format!(
                "單位 {} 的比率必須大於零",
                unit.name
            )));
        }

        let reference = quantity / from.factor;
        Ok(self.rounding_precision(to).round(reference * to.factor))
    }

    fn rounding_precision(&self, unit: &UnitOfMeasure) -> QuantityPrecision {
        QuantityPrecision::new(unit.rounding, self.fallback_rounding)
    }
}
