//! 數量捨入與比較工具
//!
//! 所有完工、啟動下一站的判斷都必須經過這裡，並使用同一張製令的同一個精度。

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// 數量精度（以單位的捨入值表示，例如 0.01）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityPrecision {
    rounding: Decimal,
}

impl QuantityPrecision {
    /// 創建新的數量精度
    ///
    /// 捨入值必須大於零，否則退回 `fallback`
    pub fn new(rounding: Decimal, fallback: Decimal) -> Self {
        let rounding = if rounding > Decimal::ZERO {
            rounding
        } else if fallback > Decimal::ZERO {
            fallback
        } else {
            Decimal::new(1, 2)
        };
        Self { rounding }
    }

    /// 以捨入值創建（非正值時使用 0.01）
    pub fn from_rounding(rounding: Decimal) -> Self {
        Self::new(rounding, Decimal::new(1, 2))
    }

    /// 捨入值
    pub fn rounding(&self) -> Decimal {
        self.rounding
    }

    /// 四捨五入到捨入值的倍數（0.5 遠離零）
    pub fn round(&self, value: Decimal) -> Decimal {
        let steps = (value / self.rounding)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        (steps * self.rounding).normalize()
    }

    /// 無條件進位到捨入值的倍數
    pub fn round_up(&self, value: Decimal) -> Decimal {
        let steps = (value / self.rounding).ceil();
        (steps * self.rounding).normalize()
    }

    /// 比較兩個數量：差值捨入後為零即視為相等
    pub fn compare(&self, a: Decimal, b: Decimal) -> Ordering {
        let delta = self.round(a - b);
        if delta.is_zero() {
            Ordering::Equal
        } else if delta < Decimal::ZERO {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    pub fn is_zero(&self, value: Decimal) -> bool {
        self.round(value).is_zero()
    }

    /// 捨入後是否大於零
    pub fn is_positive(&self, value: Decimal) -> bool {
        self.compare(value, Decimal::ZERO) == Ordering::Greater
    }

    /// a >= b（容許捨入誤差）
    pub fn gte(&self, a: Decimal, b: Decimal) -> bool {
        self.compare(a, b) != Ordering::Less
    }

    /// a <= b（容許捨入誤差）
    pub fn lte(&self, a: Decimal, b: Decimal) -> bool {
        self.compare(a, b) != Ordering::Greater
    }
}

impl Default for QuantityPrecision {
    fn default() -> Self {
        Self::from_rounding(Decimal::new(1, 2))
    }
}
