// ==========================================
// 吉他工坊生产执行系统 - 导入层
// ==========================================
// 职责: 外部数据接入 (CSV 订单)
// ==========================================

pub mod error;
pub mod order_importer;

pub use error::{ImportError, ImportResult};
pub use order_importer::{ImportReport, OrderImporter, RowError};
