// ==========================================
// 吉他工坊生产执行系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供外部请求入口调用
// ==========================================

pub mod assignment_api;
pub mod audit_api;
pub mod batch_api;
pub mod error;
pub mod order_api;
pub mod quality_api;

// 重导出核心类型
pub use assignment_api::{AssignmentApi, AssignmentInfo};
pub use audit_api::{AuditApi, AuditEntryInfo};
pub use batch_api::{BatchApi, BatchInfo, DestinationInfo};
pub use error::{ApiError, ApiResult};
pub use order_api::{OrderApi, OrderInfo};
pub use quality_api::{QualityApi, QualityCheckInfo};
