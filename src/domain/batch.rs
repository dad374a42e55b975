// ==========================================
// 吉他工坊生产执行系统 - 批次领域模型
// ==========================================
// 红线: current_stage 只能通过工序流转或管理员修正变更
// ==========================================

use crate::domain::types::{BatchPriority, StageCode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 生产批次
///
/// 一组订单在工序间整体移动的单位。current_stage 必须是
/// production_stage 表的合法成员（由 StageGraph 在流转时裁定）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub batch_no: String,           // 批次号 (唯一, 如 B-2026-0815)
    pub current_stage: StageCode,   // 当前工序
    pub priority: BatchPriority,
    pub completed: bool,            // 进入终点工序后置位
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// 成员订单ID (按 position 排序); 列表查询时可为空
    pub order_ids: Vec<String>,
}

impl Batch {
    /// 创建新批次（落在流转图入口工序）
    pub fn new(batch_no: String, entry_stage: StageCode, priority: BatchPriority) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            batch_no,
            current_stage: entry_stage,
            priority,
            completed: false,
            created_at: now,
            updated_at: now,
            order_ids: vec![],
        }
    }

    pub fn with_orders(mut self, order_ids: Vec<String>) -> Self {
        self.order_ids = order_ids;
        self
    }
}
