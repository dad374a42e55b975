// ==========================================
// 吉他工坊生产执行系统 - 审计日志领域模型
// ==========================================
// 红线: 所有写入必须记录; 日志只追加, 不修改不删除
// 用途: 审计追踪, 批次工序历史回放
// 对齐: audit_log 表 (seq 为全库单调序号)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditLogEntry - 审计日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    // ===== 主键 (对齐schema) =====
    /// 全库单调序号 (AUTOINCREMENT); 插入前为 None
    pub seq: Option<i64>,
    pub audit_id: String,          // 日志ID (UUID)
    pub batch_id: Option<String>,  // 关联批次 (订单导入等系统操作可为None)
    pub actor: String,             // 操作人
    pub action: String,            // 操作类型 (存储为字符串)
    pub created_at: NaiveDateTime, // 操作时间戳

    // ===== 工序流转字段 =====
    pub from_stage: Option<String>,        // 流转前工序
    pub to_stage: Option<String>,          // 流转后工序
    pub quality_check_id: Option<String>,  // 闸口引用的质检记录

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>,   // 操作参数 (JSON)
    pub detail: Option<String>,            // 详细描述
}

// ==========================================
// AuditAction - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    StageTransition,    // 工序流转
    BatchCreate,        // 创建批次
    OrderImport,        // 导入订单
    AssignmentCreate,   // 派工
    AssignmentComplete, // 完工
    QualityRecord,      // 记录质检
    QualityResolve,     // 质检问题关闭
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::StageTransition => "StageTransition",
            AuditAction::BatchCreate => "BatchCreate",
            AuditAction::OrderImport => "OrderImport",
            AuditAction::AssignmentCreate => "AssignmentCreate",
            AuditAction::AssignmentComplete => "AssignmentComplete",
            AuditAction::QualityRecord => "QualityRecord",
            AuditAction::QualityResolve => "QualityResolve",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "StageTransition" => Some(AuditAction::StageTransition),
            "BatchCreate" => Some(AuditAction::BatchCreate),
            "OrderImport" => Some(AuditAction::OrderImport),
            "AssignmentCreate" => Some(AuditAction::AssignmentCreate),
            "AssignmentComplete" => Some(AuditAction::AssignmentComplete),
            "QualityRecord" => Some(AuditAction::QualityRecord),
            "QualityResolve" => Some(AuditAction::QualityResolve),
            _ => None,
        }
    }
}

// ==========================================
// AuditLogEntry 辅助方法
// ==========================================
impl AuditLogEntry {
    /// 创建新的审计日志
    ///
    /// # 参数
    /// - `batch_id`: 关联批次ID (可选)
    /// - `action`: 操作类型
    /// - `actor`: 操作人
    pub fn new(batch_id: Option<String>, action: AuditAction, actor: String) -> Self {
        Self {
            seq: None,
            audit_id: uuid::Uuid::new_v4().to_string(),
            batch_id,
            actor,
            action: action.as_str().to_string(),
            created_at: chrono::Utc::now().naive_utc(),
            from_stage: None,
            to_stage: None,
            quality_check_id: None,
            payload_json: None,
            detail: None,
        }
    }

    /// 创建工序流转日志
    pub fn stage_transition(
        batch_id: String,
        actor: String,
        from_stage: &str,
        to_stage: &str,
        quality_check_id: Option<String>,
    ) -> Self {
        let mut entry = Self::new(Some(batch_id), AuditAction::StageTransition, actor);
        entry.from_stage = Some(from_stage.to_string());
        entry.to_stage = Some(to_stage.to_string());
        entry.quality_check_id = quality_check_id;
        entry
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip() {
        let actions = [
            AuditAction::StageTransition,
            AuditAction::BatchCreate,
            AuditAction::OrderImport,
            AuditAction::AssignmentCreate,
            AuditAction::AssignmentComplete,
            AuditAction::QualityRecord,
            AuditAction::QualityResolve,
        ];
        for action in actions {
            assert_eq!(AuditAction::from_str(action.as_str()), Some(action));
        }
        assert_eq!(AuditAction::from_str("Unknown"), None);
    }

    #[test]
    fn test_stage_transition_entry_fields() {
        let entry = AuditLogEntry::stage_transition(
            "B1".to_string(),
            "mgr01".to_string(),
            "sanding",
            "finishing",
            None,
        );
        assert_eq!(entry.action, "StageTransition");
        assert_eq!(entry.from_stage.as_deref(), Some("sanding"));
        assert_eq!(entry.to_stage.as_deref(), Some("finishing"));
        assert!(entry.seq.is_none());
    }
}
