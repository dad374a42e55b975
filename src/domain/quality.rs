// ==========================================
// 吉他工坊生产执行系统 - 质检领域模型
// ==========================================
// 说明: 质检记录是流转闸口的只读输入; resolve 只改记录, 不驱动流转
// ==========================================

use crate::domain::types::{QualityOutcome, StageCode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 质检记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheck {
    pub check_id: String,
    pub batch_id: String,
    pub stage_code: StageCode,      // 被检工序 (离开该工序时的闸口)
    pub outcome: QualityOutcome,
    pub notes: Option<String>,
    pub inspector: String,          // 检验人
    pub resolved_by: Option<String>,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl QualityCheck {
    pub fn new(
        batch_id: String,
        stage_code: StageCode,
        outcome: QualityOutcome,
        inspector: String,
    ) -> Self {
        Self {
            check_id: uuid::Uuid::new_v4().to_string(),
            batch_id,
            stage_code,
            outcome,
            notes: None,
            inspector,
            resolved_by: None,
            resolved_at: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// 是否满足指定批次/工序上的质检闸口
    pub fn satisfies_gate_for(&self, batch_id: &str, stage: &StageCode) -> bool {
        self.batch_id == batch_id && &self.stage_code == stage && self.outcome.satisfies_gate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_requires_matching_batch_stage_and_pass() {
        let check = QualityCheck::new(
            "B1".to_string(),
            StageCode::from("acoustic_qc"),
            QualityOutcome::Pass,
            "qa01".to_string(),
        );

        assert!(check.satisfies_gate_for("B1", &StageCode::from("acoustic_qc")));
        // 批次不匹配
        assert!(!check.satisfies_gate_for("B2", &StageCode::from("acoustic_qc")));
        // 工序不匹配
        assert!(!check.satisfies_gate_for("B1", &StageCode::from("sanding")));

        let failing = QualityCheck::new(
            "B1".to_string(),
            StageCode::from("acoustic_qc"),
            QualityOutcome::Fail,
            "qa01".to_string(),
        );
        assert!(!failing.satisfies_gate_for("B1", &StageCode::from("acoustic_qc")));
    }
}
