// ==========================================
// 吉他工坊生产执行系统 - 引擎层错误类型
// ==========================================
// 职责: 工序流转/派工/质检的业务判定错误
// 红线: 每种拒绝必须可区分 (调用方据此决定是否重试/补质检/改目标)
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 工作流错误类型
#[derive(Error, Debug)]
pub enum WorkflowError {
    // ===== 身份与权限 =====
    #[error("未认证: 操作人 {actor_id} 不存在")]
    Unauthorized { actor_id: String },

    #[error("权限不足: 操作人 {actor_id} 角色为 {role}, 本操作要求 {required}")]
    Forbidden {
        actor_id: String,
        role: String,
        required: String,
    },

    // ===== 资源解析 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("未知工序: {0}")]
    UnknownStage(String),

    // ===== 流转判定 =====
    #[error("无效的工序流转: from={from} to={to} (不在配置的流转图中)")]
    InvalidTransition { from: String, to: String },

    #[error("质检闸口未满足: {0}")]
    QualityGateNotSatisfied(String),

    // ===== 并发控制 =====
    #[error("并发冲突: 批次 {batch_id} 的工序已被其他操作人改走 (校验时={expected}, 提交时={actual})")]
    Conflict {
        batch_id: String,
        expected: String,
        actual: String,
    },

    #[error("派工冲突: 批次 {batch_id} 工序 {stage} 已有未完成派工")]
    AssignmentConflict { batch_id: String, stage: String },

    // ===== 底层透传 =====
    #[error(transparent)]
    Repository(RepositoryError),

    #[error("内部错误: {0}")]
    Internal(String),
}

// 仓储错误映射: CAS冲突升格为业务可见的 Conflict, 其余透传
impl From<RepositoryError> for WorkflowError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StageConflict {
                batch_id,
                expected,
                actual,
            } => WorkflowError::Conflict {
                batch_id,
                expected,
                actual,
            },
            RepositoryError::NotFound { entity, id } => WorkflowError::NotFound { entity, id },
            other => WorkflowError::Repository(other),
        }
    }
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;
