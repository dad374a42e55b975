// ==========================================
// 吉他工坊生产执行系统 - 数据仓储层
// ==========================================
// 红线: Repository 不做业务逻辑, 只做数据映射与事务边界
// ==========================================

pub mod assignment_repo;
pub mod audit_log_repo;
pub mod batch_repo;
pub mod error;
pub mod notification_repo;
pub mod order_repo;
pub mod quality_repo;
pub mod worker_repo;

pub use assignment_repo::AssignmentRepository;
pub use audit_log_repo::AuditLogRepository;
pub use batch_repo::BatchRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use notification_repo::{Notification, NotificationRepository};
pub use order_repo::OrderRepository;
pub use quality_repo::QualityCheckRepository;
pub use worker_repo::WorkerRepository;
