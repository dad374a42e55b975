// ==========================================
// 吉他工坊生产执行系统 - 派工 API
// ==========================================
// 职责: 派工创建/完工入口, DTO 转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::assignment::StageAssignment;
use crate::domain::types::StageCode;
use crate::engine::assignment::AssignmentEngine;
use crate::repository::assignment_repo::AssignmentRepository;

/// 派工信息 (对外表示)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentInfo {
    pub assignment_id: String,
    pub batch_id: String,
    pub stage_code: String,
    pub worker_id: String,
    pub assigned_by: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub quality_status: Option<String>,
    pub time_spent_minutes: Option<i32>,
}

impl From<StageAssignment> for AssignmentInfo {
    fn from(a: StageAssignment) -> Self {
        Self {
            assignment_id: a.assignment_id,
            batch_id: a.batch_id,
            stage_code: a.stage_code.to_string(),
            worker_id: a.worker_id,
            assigned_by: a.assigned_by,
            started_at: a.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            completed_at: a
                .completed_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            quality_status: a.quality_status,
            time_spent_minutes: a.time_spent_minutes,
        }
    }
}

// ==========================================
// AssignmentApi - 派工 API
// ==========================================
pub struct AssignmentApi {
    assignment_engine: Arc<AssignmentEngine>,
    assignment_repo: Arc<AssignmentRepository>,
}

impl AssignmentApi {
    pub fn new(
        assignment_engine: Arc<AssignmentEngine>,
        assignment_repo: Arc<AssignmentRepository>,
    ) -> Self {
        Self {
            assignment_engine,
            assignment_repo,
        }
    }

    /// 派工
    pub fn assign(
        &self,
        batch_id: &str,
        worker_id: &str,
        stage: &str,
        acting_worker_id: &str,
    ) -> ApiResult<AssignmentInfo> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }
        if worker_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("员工ID不能为空".to_string()));
        }
        if stage.trim().is_empty() {
            return Err(ApiError::InvalidInput("工序不能为空".to_string()));
        }

        let assignment = self.assignment_engine.assign(
            batch_id,
            worker_id,
            &StageCode::from(stage),
            acting_worker_id,
        )?;

        Ok(AssignmentInfo::from(assignment))
    }

    /// 完工
    pub fn complete(
        &self,
        assignment_id: &str,
        acting_worker_id: &str,
        quality_status: &str,
        time_spent_minutes: i32,
    ) -> ApiResult<AssignmentInfo> {
        if assignment_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("派工ID不能为空".to_string()));
        }
        if quality_status.trim().is_empty() {
            return Err(ApiError::InvalidInput("质量状态不能为空".to_string()));
        }
        if time_spent_minutes < 0 {
            return Err(ApiError::InvalidInput("耗时不能为负".to_string()));
        }

        let assignment = self.assignment_engine.complete(
            assignment_id,
            acting_worker_id,
            quality_status,
            time_spent_minutes,
        )?;

        Ok(AssignmentInfo::from(assignment))
    }

    /// 员工的未完成派工
    pub fn list_open_by_worker(&self, worker_id: &str) -> ApiResult<Vec<AssignmentInfo>> {
        if worker_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("员工ID不能为空".to_string()));
        }

        let assignments = self.assignment_repo.find_open_by_worker(worker_id)?;
        Ok(assignments.into_iter().map(AssignmentInfo::from).collect())
    }
}
