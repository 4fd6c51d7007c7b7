//! 工單數量帳

use mes_core::{
    ManufacturingOrder, MesError, QuantityPrecision, Result, Tracking, UomService, WorkOrder,
};
use rust_decimal::Decimal;

/// 工單數量帳：目標、報工中、已完成數量的捨入比較
///
/// 同一張製令的所有判斷都使用同一個精度。
#[derive(Debug, Clone, Copy)]
pub struct QuantityLedger {
    precision: QuantityPrecision,
}

impl QuantityLedger {
    pub fn new(precision: QuantityPrecision) -> Self {
        Self { precision }
    }

    /// 以製令單位的精度創建
    pub fn for_order(order: &ManufacturingOrder, uom: &dyn UomService) -> Self {
        Self::new(uom.rounding_precision(&order.uom))
    }

    pub fn precision(&self) -> &QuantityPrecision {
        &self.precision
    }

    /// 已完成數量是否達到目標
    pub fn is_complete(&self, wo: &WorkOrder) -> bool {
        wo.is_fully_produced(&self.precision)
    }

    /// 剩餘數量（不小於零）
    pub fn remaining(&self, wo: &WorkOrder) -> Decimal {
        wo.remaining(&self.precision).max(Decimal::ZERO)
    }

    /// 將本次報工數量計入已完成數量，回傳計入的數量
    ///
    /// 報工數量在輸入時已捨入，這裡直接累加，與成品/元件的過帳數量一致。
    pub fn post(&self, wo: &mut WorkOrder) -> Decimal {
        let posted = wo.quantity_producing;
        wo.quantity_produced += posted;
        posted
    }

    /// 新工單的初始報工數量
    ///
    /// 序號追蹤的成品一次一件；其他情況為工單數量與製令尚未完成數量的較小者。
    pub fn initial_producing(&self, order: &ManufacturingOrder, quantity: Decimal) -> Decimal {
        let quantity = self.precision.round(quantity).max(Decimal::ZERO);
        if order.product.tracking == Tracking::Serial {
            return if self.precision.is_positive(quantity) {
                Decimal::ONE
            } else {
                Decimal::ZERO
            };
        }
        self.precision
            .round(order.product_qty - order.finished_quantity())
            .max(Decimal::ZERO)
            .min(quantity)
    }

    /// 將操作員輸入的報工數量捨入到製令精度並檢查
    pub fn normalize_producing(
        &self,
        wo: &WorkOrder,
        quantity: Decimal,
        tracking: Tracking,
    ) -> Result<Decimal> {
        let quantity = self.precision.round(quantity);
        self.validate_producing(wo, quantity, tracking)?;
        Ok(quantity)
    }

    /// 檢查操作員輸入的報工數量
    pub fn validate_producing(
        &self,
        wo: &WorkOrder,
        quantity: Decimal,
        tracking: Tracking,
    ) -> Result<()> {
        if quantity < Decimal::ZERO {
            return Err(MesError::InvalidQuantity(format!(
                "報工數量不可為負: {}",
                quantity
            )));
        }

        if tracking == Tracking::Serial && quantity != Decimal::ZERO && quantity != Decimal::ONE {
            return Err(MesError::InvalidQuantity(format!(
                "序號追蹤的成品一次只能報工一件: {}",
                quantity
            )));
        }

        let remaining = self.remaining(wo);
        if self.precision.compare(quantity, remaining) == std::cmp::Ordering::Greater {
            return Err(MesError::QuantityExceedsRemaining {
                work_order: wo.name.clone(),
                requested: quantity,
                remaining,
            });
        }

        Ok(())
    }

    /// 工單提前結束時，其他未完工工單的新報工數量
    pub fn propagated_producing(&self, wo: &WorkOrder, tracking: Tracking) -> Decimal {
        let remaining = self.remaining(wo);
        if tracking == Tracking::Serial {
            remaining.min(Decimal::ONE)
        } else {
            remaining
        }
    }
}
