// ==========================================
// 吉他工坊生产执行系统 - 领域层
// ==========================================
// 职责: 实体与类型定义, 无 I/O
// ==========================================

pub mod assignment;
pub mod audit_log;
pub mod batch;
pub mod order;
pub mod quality;
pub mod types;
pub mod worker;

// 重导出核心类型
pub use assignment::StageAssignment;
pub use audit_log::{AuditAction, AuditLogEntry};
pub use batch::Batch;
pub use order::Order;
pub use quality::QualityCheck;
pub use types::{BatchPriority, QualityOutcome, Role, StageCode};
pub use worker::Worker;
