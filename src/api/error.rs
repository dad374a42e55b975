// ==========================================
// 吉他工坊生产执行系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 把引擎/仓储/导入错误转换为调用方可分辨的错误种类
// 红线: 所有拒绝必须带显式原因 (可解释性)
// ==========================================

use crate::engine::error::WorkflowError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 每个变体对应一种调用方可分辨的错误种类; 前端据此决定提示与重试策略
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 身份与权限
    // ==========================================
    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("权限不足: {0}")]
    Forbidden(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的工序流转: from={from} to={to}")]
    InvalidTransition { from: String, to: String },

    #[error("质检闸口未满足: {0}")]
    QualityGateNotSatisfied(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("并发冲突: {0}")]
    Conflict(String),

    #[error("派工冲突: {0}")]
    AssignmentConflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 WorkflowError 转换
// 目的: 引擎层判定结果原样映射到调用方错误种类
// ==========================================
impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Unauthorized { actor_id } => {
                ApiError::Unauthorized(format!("操作人 {} 不存在", actor_id))
            }
            WorkflowError::Forbidden {
                actor_id,
                role,
                required,
            } => ApiError::Forbidden(format!(
                "操作人 {} 角色为 {}, 本操作要求 {}",
                actor_id, role, required
            )),
            WorkflowError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            WorkflowError::UnknownStage(stage) => {
                ApiError::InvalidInput(format!("未知工序: {}", stage))
            }
            WorkflowError::InvalidTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            WorkflowError::QualityGateNotSatisfied(msg) => ApiError::QualityGateNotSatisfied(msg),
            WorkflowError::Conflict {
                batch_id,
                expected,
                actual,
            } => ApiError::Conflict(format!(
                "批次 {} 的工序已被其他操作人改走 (校验时={}, 提交时={})",
                batch_id, expected, actual
            )),
            WorkflowError::AssignmentConflict { batch_id, stage } => ApiError::AssignmentConflict(
                format!("批次 {} 工序 {} 已有未完成派工", batch_id, stage),
            ),
            WorkflowError::Repository(repo_err) => repo_err.into(),
            WorkflowError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StageConflict {
                batch_id,
                expected,
                actual,
            } => ApiError::Conflict(format!(
                "批次 {} 的工序已被其他操作人改走 (校验时={}, 提交时={})",
                batch_id, expected, actual
            )),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FieldValueError { .. }
            | ImportError::DateFormatError { .. }
            | ImportError::DuplicateOrderNo { .. } => ApiError::ValidationError(err.to_string()),
            ImportError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
