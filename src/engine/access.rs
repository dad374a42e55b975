// ==========================================
// 吉他工坊生产执行系统 - 权限判定
// ==========================================
// 职责: 统一的角色能力检查, 供所有写操作复用
// 红线: 禁止在各操作里散落内联角色比较; 本函数是唯一判定入口
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::types::Role;
use crate::domain::worker::Worker;
use crate::engine::error::{WorkflowError, WorkflowResult};

/// 管理类操作的角色集 (流转/派工/建批次/质检关闭)
pub const MANAGE_ROLES: &[Role] = &[Role::Manager, Role::Admin];

/// 校验操作人具备要求角色之一
///
/// # 判定顺序
/// 1. 身份缺失 (查无此人) -> Unauthorized
/// 2. 已离职 -> Forbidden (身份存在但无任何能力)
/// 3. 角色不在要求集合 -> Forbidden
///
/// # 参数
/// - actor_id: 请求声明的操作人ID (用于错误信息)
/// - actor: 员工目录解析结果
/// - required: 要求的角色集合
///
/// # 返回
/// 通过时返回员工引用, 供调用方继续使用
pub fn require_role<'a>(
    actor_id: &str,
    actor: Option<&'a Worker>,
    required: &[Role],
) -> WorkflowResult<&'a Worker> {
    let worker = actor.ok_or_else(|| WorkflowError::Unauthorized {
        actor_id: actor_id.to_string(),
    })?;

    let required_desc = || {
        required
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join("/")
    };

    if !worker.active {
        return Err(WorkflowError::Forbidden {
            actor_id: worker.worker_id.clone(),
            role: format!("{}(inactive)", worker.role),
            required: required_desc(),
        });
    }

    if !required.contains(&worker.role) {
        return Err(WorkflowError::Forbidden {
            actor_id: worker.worker_id.clone(),
            role: worker.role.to_string(),
            required: required_desc(),
        });
    }

    Ok(worker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(role: Role) -> Worker {
        Worker::new("w01".to_string(), "张师傅".to_string(), role)
    }

    #[test]
    fn test_missing_actor_is_unauthorized() {
        let err = require_role("ghost", None, MANAGE_ROLES).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[test]
    fn test_worker_role_is_forbidden_for_manage() {
        let w = worker(Role::Worker);
        let err = require_role("w01", Some(&w), MANAGE_ROLES).unwrap_err();
        match err {
            WorkflowError::Forbidden { role, required, .. } => {
                assert_eq!(role, "worker");
                assert_eq!(required, "manager/admin");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_manager_and_admin_pass() {
        let m = worker(Role::Manager);
        assert!(require_role("w01", Some(&m), MANAGE_ROLES).is_ok());

        let a = worker(Role::Admin);
        assert!(require_role("w01", Some(&a), MANAGE_ROLES).is_ok());
    }

    #[test]
    fn test_inactive_worker_is_forbidden() {
        let mut m = worker(Role::Manager);
        m.active = false;
        let err = require_role("w01", Some(&m), MANAGE_ROLES).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));
    }
}
