// ==========================================
// 吉他工坊生产执行系统 - 派工领域模型
// ==========================================
// 约束: 同一 (批次, 工序) 最多一条未完成派工 (库级部分唯一索引兜底)
// ==========================================

use crate::domain::types::StageCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 工序派工
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAssignment {
    pub assignment_id: String,
    pub batch_id: String,
    pub stage_code: StageCode,
    pub worker_id: String,          // 被派工人
    pub assigned_by: String,        // 派工人 (manager/admin)
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub quality_status: Option<String>,      // 完工自报质量状态
    pub time_spent_minutes: Option<i32>,
}

impl StageAssignment {
    pub fn new(batch_id: String, stage_code: StageCode, worker_id: String, assigned_by: String) -> Self {
        Self {
            assignment_id: uuid::Uuid::new_v4().to_string(),
            batch_id,
            stage_code,
            worker_id,
            assigned_by,
            started_at: chrono::Utc::now().naive_utc(),
            completed_at: None,
            quality_status: None,
            time_spent_minutes: None,
        }
    }

    /// 是否仍在进行中
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}
