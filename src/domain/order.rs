// ==========================================
// 吉他工坊生产执行系统 - 订单领域模型
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 客户订单
///
/// 订单通过 batch_orders 成组进入批次; 订单本身不携带工序状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub order_no: String,       // 业务单号 (唯一)
    pub model: String,          // 琴型 (如 OM-28, D-18)
    pub customer_name: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl Order {
    pub fn new(order_no: String, model: String, customer_name: String) -> Self {
        Self {
            order_id: uuid::Uuid::new_v4().to_string(),
            order_no,
            model,
            customer_name,
            due_date: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}
