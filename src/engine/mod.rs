// ==========================================
// 吉他工坊生产执行系统 - 引擎层
// ==========================================
// 职责: 业务规则 (流转判定、派工约束、质检闸口、权限)
// ==========================================

pub mod access;
pub mod assignment;
pub mod error;
pub mod events;
pub mod quality;
pub mod transition;

pub use access::{require_role, MANAGE_ROLES};
pub use assignment::AssignmentEngine;
pub use error::{WorkflowError, WorkflowResult};
pub use events::{DbNotificationSink, NoopNotificationSink, NotificationSink};
pub use quality::QualityGateEngine;
pub use transition::{StageTransitionEngine, TransitionRequest};
