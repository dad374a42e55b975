// ==========================================
// 吉他工坊生产执行系统 - 质检 API
// ==========================================
// 职责: 质检登记/问题关闭入口, DTO 转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::quality::QualityCheck;
use crate::domain::types::{QualityOutcome, StageCode};
use crate::engine::quality::QualityGateEngine;
use crate::repository::quality_repo::QualityCheckRepository;

/// 质检信息 (对外表示)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheckInfo {
    pub check_id: String,
    pub batch_id: String,
    pub stage_code: String,
    pub outcome: String,
    pub notes: Option<String>,
    pub inspector: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

impl From<QualityCheck> for QualityCheckInfo {
    fn from(c: QualityCheck) -> Self {
        Self {
            check_id: c.check_id,
            batch_id: c.batch_id,
            stage_code: c.stage_code.to_string(),
            outcome: c.outcome.to_string(),
            notes: c.notes,
            inspector: c.inspector,
            resolved_by: c.resolved_by,
            resolved_at: c
                .resolved_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            created_at: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// ==========================================
// QualityApi - 质检 API
// ==========================================
pub struct QualityApi {
    quality_engine: Arc<QualityGateEngine>,
    quality_repo: Arc<QualityCheckRepository>,
}

impl QualityApi {
    pub fn new(
        quality_engine: Arc<QualityGateEngine>,
        quality_repo: Arc<QualityCheckRepository>,
    ) -> Self {
        Self {
            quality_engine,
            quality_repo,
        }
    }

    /// 登记质检记录
    pub fn record(
        &self,
        batch_id: &str,
        stage: &str,
        outcome: &str,
        notes: Option<String>,
        inspector_id: &str,
    ) -> ApiResult<QualityCheckInfo> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }
        let outcome = QualityOutcome::from_str(outcome).ok_or_else(|| {
            ApiError::InvalidInput(format!("非法质检结论: {} (允许 pass/fail/hold)", outcome))
        })?;

        let check = self.quality_engine.record(
            batch_id,
            &StageCode::from(stage),
            outcome,
            notes,
            inspector_id,
        )?;

        Ok(QualityCheckInfo::from(check))
    }

    /// 关闭质检问题
    pub fn resolve(
        &self,
        check_id: &str,
        resolution_notes: &str,
        resolver_id: &str,
    ) -> ApiResult<QualityCheckInfo> {
        if check_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("质检记录ID不能为空".to_string()));
        }
        if resolution_notes.trim().is_empty() {
            return Err(ApiError::InvalidInput("处理说明不能为空".to_string()));
        }

        let check = self
            .quality_engine
            .resolve(check_id, resolution_notes, resolver_id)?;

        Ok(QualityCheckInfo::from(check))
    }

    /// 批次的全部质检记录
    pub fn list_by_batch(&self, batch_id: &str) -> ApiResult<Vec<QualityCheckInfo>> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let checks = self.quality_repo.find_by_batch(batch_id)?;
        Ok(checks.into_iter().map(QualityCheckInfo::from).collect())
    }
}
