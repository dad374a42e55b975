// ==========================================
// 吉他工坊生产执行系统 - 领域类型定义
// ==========================================
// 红线: 角色/优先级/质检结论为封闭枚举; 工序集合为查找数据, 不硬编码
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 角色 (Role)
// ==========================================
// 权限来源: workers 表的 role 字段（唯一身份模型，不存在并行的员工表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,  // 普通工人
    Manager, // 车间主管
    Admin,   // 系统管理员
}

impl Role {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "worker" => Some(Role::Worker),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 批次优先级 (Batch Priority)
// ==========================================
// 等级制,不是评分制
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPriority {
    Low,
    Standard,
    High,
    Urgent,
}

impl BatchPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPriority::Low => "low",
            BatchPriority::Standard => "standard",
            BatchPriority::High => "high",
            BatchPriority::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(BatchPriority::Low),
            "standard" => Some(BatchPriority::Standard),
            "high" => Some(BatchPriority::High),
            "urgent" => Some(BatchPriority::Urgent),
            _ => None,
        }
    }
}

impl fmt::Display for BatchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 质检结论 (Quality Outcome)
// ==========================================
// 闸口判定只认 Pass; Fail/Hold 均不放行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityOutcome {
    Pass, // 合格
    Fail, // 不合格
    Hold, // 待定（复检中）
}

impl QualityOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityOutcome::Pass => "pass",
            QualityOutcome::Fail => "fail",
            QualityOutcome::Hold => "hold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(QualityOutcome::Pass),
            "fail" => Some(QualityOutcome::Fail),
            "hold" => Some(QualityOutcome::Hold),
            _ => None,
        }
    }

    /// 是否满足质检闸口
    pub fn satisfies_gate(&self) -> bool {
        matches!(self, QualityOutcome::Pass)
    }
}

impl fmt::Display for QualityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工序代码 (Stage Code)
// ==========================================
// 工序集合存储在 production_stage 查找表中, 新增工序是数据变更而非代码变更。
// StageCode 只是一个带校验入口的字符串新类型, 合法性由 StageGraph 在加载时裁定。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageCode(String);

impl StageCode {
    pub fn new(code: impl Into<String>) -> Self {
        StageCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageCode {
    fn from(s: &str) -> Self {
        StageCode(s.to_string())
    }
}

impl From<String> for StageCode {
    fn from(s: String) -> Self {
        StageCode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Worker, Role::Manager, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("supervisor"), None);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(BatchPriority::Urgent > BatchPriority::High);
        assert!(BatchPriority::High > BatchPriority::Standard);
        assert!(BatchPriority::Standard > BatchPriority::Low);
    }

    #[test]
    fn test_only_pass_satisfies_gate() {
        assert!(QualityOutcome::Pass.satisfies_gate());
        assert!(!QualityOutcome::Fail.satisfies_gate());
        assert!(!QualityOutcome::Hold.satisfies_gate());
    }
}
