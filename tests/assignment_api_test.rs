// ==========================================
// 派工 API 测试
// ==========================================
// 职责: 验证派工创建/冲突/完工权限与完工通知
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use guitar_works_mes::api::ApiError;
use test_helpers::{seed_batch, setup_test_env};

#[test]
fn test_assign_worker_to_stage() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A001");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();
    assert_eq!(assignment.batch_id, batch_id);
    assert_eq!(assignment.worker_id, "w01");
    assert_eq!(assignment.stage_code, "intake");
    assert_eq!(assignment.assigned_by, "mgr01");
    assert!(assignment.completed_at.is_none());

    let open = state.assignment_api.list_open_by_worker("w01").unwrap();
    assert_eq!(open.len(), 1);
}

#[test]
fn test_worker_cannot_assign() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A002");

    let err = state
        .assignment_api
        .assign(&batch_id, "w02", "intake", "w01")
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
}

#[test]
fn test_assign_unknown_stage_rejected() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A003");

    let err = state
        .assignment_api
        .assign(&batch_id, "w01", "varnish_room", "mgr01")
        .unwrap_err();
    // 未知工序按输入校验处理
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_second_open_assignment_conflicts() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A004");

    state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();

    // 同 (批次, 工序) 再派 -> 冲突, 换人也不行
    let err = state
        .assignment_api
        .assign(&batch_id, "w02", "intake", "mgr01")
        .unwrap_err();
    assert!(matches!(err, ApiError::AssignmentConflict(_)));

    // 其他工序不受影响
    assert!(state
        .assignment_api
        .assign(&batch_id, "w02", "sanding", "mgr01")
        .is_ok());
}

#[test]
fn test_complete_by_assignee() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A005");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();

    // 本人完工无需管理角色
    let closed = state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 95)
        .unwrap();
    assert!(closed.completed_at.is_some());
    assert_eq!(closed.quality_status.as_deref(), Some("良好"));
    assert_eq!(closed.time_spent_minutes, Some(95));

    // 关闭后可重新派同一工序
    assert!(state
        .assignment_api
        .assign(&batch_id, "w02", "intake", "mgr01")
        .is_ok());
}

#[test]
fn test_complete_by_other_worker_forbidden() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A006");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();

    // 工人不能代别人完工
    let err = state
        .assignment_api
        .complete(&assignment.assignment_id, "w02", "良好", 10)
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // 主管可以代完工
    assert!(state
        .assignment_api
        .complete(&assignment.assignment_id, "mgr01", "良好", 10)
        .is_ok());
}

#[test]
fn test_double_complete_fails() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A007");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();
    state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 30)
        .unwrap();

    let err = state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 30)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_complete_writes_notification() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A008");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();
    state
        .assignment_api
        .complete(&assignment.assignment_id, "mgr01", "良好", 45)
        .unwrap();

    // 默认开关开启: 被派员工收到未读通知
    let unread = state.notification_repo.list_unread("w01").unwrap();
    assert_eq!(unread.len(), 1);
    assert!(unread[0].title.contains("intake"));

    state
        .notification_repo
        .mark_read(&unread[0].notification_id)
        .unwrap();
    assert!(state.notification_repo.list_unread("w01").unwrap().is_empty());
}

#[test]
fn test_notification_switch_off_suppresses_notification() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A010");

    // 关闭完工通知开关
    {
        let conn = test_helpers::state_conn(&state);
        let conn = conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', 'notify/assignment_complete', 'false', datetime('now'))",
            [],
        )
        .unwrap();
    }

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();
    state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 15)
        .unwrap();

    assert!(state.notification_repo.list_unread("w01").unwrap().is_empty());
}

#[test]
fn test_assignment_actions_are_audited() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-A009");

    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "intake", "mgr01")
        .unwrap();
    state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 20)
        .unwrap();

    let history = state.audit_api.batch_history(&batch_id).unwrap();
    let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"AssignmentCreate"));
    assert!(actions.contains(&"AssignmentComplete"));
}
