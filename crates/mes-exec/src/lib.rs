//! # MES Execution Engine
//!
//! 工單報工、批號歸屬與工單鏈推進引擎

pub mod activator;
pub mod completion;
pub mod engine;
pub mod factory;
pub mod ledger;
pub mod reconcile;

// Re-export 主要類型
pub use activator::ChainActivator;
pub use completion::CompletionEngine;
pub use engine::WorkOrderEngine;
pub use factory::WorkOrderFactory;
pub use ledger::QuantityLedger;
pub use reconcile::IdentityReconciler;

use mes_core::{IdentityService, PutawayService, UomService};

/// 報工時需要的外部協作服務
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// 批號/序號配發
    pub identities: &'a dyn IdentityService,

    /// 上架庫位解析
    pub putaway: &'a dyn PutawayService,

    /// 單位換算
    pub uom: &'a dyn UomService,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        identities: &'a dyn IdentityService,
        putaway: &'a dyn PutawayService,
        uom: &'a dyn UomService,
    ) -> Self {
        Self {
            identities,
            putaway,
            uom,
        }
    }
}
