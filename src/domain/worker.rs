// ==========================================
// 吉他工坊生产执行系统 - 员工领域模型
// ==========================================
// 说明: workers 表是唯一身份来源; 角色即权限
// ==========================================

use crate::domain::types::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 员工主数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl Worker {
    pub fn new(worker_id: String, name: String, role: Role) -> Self {
        Self {
            worker_id,
            name,
            role,
            active: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
