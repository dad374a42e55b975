// ==========================================
// 吉他工坊生产执行系统 - 审计 API
// ==========================================
// 职责: 审计日志查询 (批次工序历史回放)
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::audit_log::{AuditAction, AuditLogEntry};
use crate::repository::audit_log_repo::AuditLogRepository;

/// 审计日志信息 (对外表示)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryInfo {
    pub seq: i64,
    pub audit_id: String,
    pub batch_id: Option<String>,
    pub actor: String,
    pub action: String,
    pub from_stage: Option<String>,
    pub to_stage: Option<String>,
    pub quality_check_id: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditEntryInfo {
    fn from(e: AuditLogEntry) -> Self {
        Self {
            seq: e.seq.unwrap_or(0),
            audit_id: e.audit_id,
            batch_id: e.batch_id,
            actor: e.actor,
            action: e.action,
            from_stage: e.from_stage,
            to_stage: e.to_stage,
            quality_check_id: e.quality_check_id,
            detail: e.detail,
            created_at: e.created_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        }
    }
}

// ==========================================
// AuditApi - 审计 API
// ==========================================
pub struct AuditApi {
    audit_repo: Arc<AuditLogRepository>,
}

impl AuditApi {
    pub fn new(audit_repo: Arc<AuditLogRepository>) -> Self {
        Self { audit_repo }
    }

    /// 批次全部审计日志 (按提交顺序)
    pub fn batch_history(&self, batch_id: &str) -> ApiResult<Vec<AuditEntryInfo>> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let entries = self.audit_repo.find_by_batch(batch_id)?;
        Ok(entries.into_iter().map(AuditEntryInfo::from).collect())
    }

    /// 批次工序流转历史 (只含 StageTransition, 回放即得工序序列)
    pub fn stage_history(&self, batch_id: &str) -> ApiResult<Vec<AuditEntryInfo>> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let entries = self
            .audit_repo
            .find_by_batch_and_action(batch_id, AuditAction::StageTransition.as_str())?;
        Ok(entries.into_iter().map(AuditEntryInfo::from).collect())
    }

    /// 最近 N 条日志 (运维用)
    pub fn recent(&self, limit: i64) -> ApiResult<Vec<AuditEntryInfo>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput("limit 必须为正".to_string()));
        }

        let entries = self.audit_repo.recent(limit)?;
        Ok(entries.into_iter().map(AuditEntryInfo::from).collect())
    }
}
