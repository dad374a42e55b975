// ==========================================
// 批次 API 测试
// ==========================================
// 职责: 验证批次创建规则、查询排序与允许去向
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use guitar_works_mes::api::ApiError;
use guitar_works_mes::domain::types::BatchPriority;
use test_helpers::{seed_batch, seed_order, setup_test_env};

#[test]
fn test_create_batch_lands_on_entry_stage() {
    let (_tmp, state) = setup_test_env();
    let o1 = seed_order(&state, "SO-3001");
    let o2 = seed_order(&state, "SO-3002");

    let batch = state
        .batch_api
        .create_batch("B-B001", vec![o1.clone(), o2.clone()], BatchPriority::Urgent, "mgr01")
        .unwrap();
    assert_eq!(batch.batch_no, "B-B001");
    assert_eq!(batch.current_stage, "intake");
    assert_eq!(batch.priority, "urgent");
    assert!(!batch.completed);
    assert_eq!(batch.order_ids, vec![o1, o2]);

    // 创建动作落审计
    let history = state.audit_api.batch_history(&batch.batch_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "BatchCreate");
}

#[test]
fn test_create_batch_validations() {
    let (_tmp, state) = setup_test_env();
    let order_id = seed_order(&state, "SO-3010");

    let err = state
        .batch_api
        .create_batch("  ", vec![order_id.clone()], BatchPriority::Standard, "mgr01")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .batch_api
        .create_batch("B-B010", vec![], BatchPriority::Standard, "mgr01")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .batch_api
        .create_batch(
            "B-B010",
            vec!["no-such-order".to_string()],
            BatchPriority::Standard,
            "mgr01",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 工人不能建批次
    let err = state
        .batch_api
        .create_batch("B-B010", vec![order_id], BatchPriority::Standard, "w01")
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
}

#[test]
fn test_list_open_batches_orders_by_priority() {
    let (_tmp, state) = setup_test_env();

    for (no, priority) in [
        ("B-B020", BatchPriority::Low),
        ("B-B021", BatchPriority::Urgent),
        ("B-B022", BatchPriority::Standard),
    ] {
        let order_id = seed_order(&state, &format!("SO-{}", no));
        state
            .batch_api
            .create_batch(no, vec![order_id], priority, "mgr01")
            .unwrap();
    }

    let batches = state.batch_api.list_open_batches().unwrap();
    let nos: Vec<&str> = batches.iter().map(|b| b.batch_no.as_str()).collect();
    assert_eq!(nos, vec!["B-B021", "B-B022", "B-B020"]);
}

#[test]
fn test_completed_batch_leaves_open_list() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-B030");
    test_helpers::advance_batch_to(&state, &batch_id, "acoustic_qc");

    let check = state
        .quality_api
        .record(&batch_id, "acoustic_qc", "pass", None, "w01")
        .unwrap();
    for (target, gate) in [("packaging", Some(check.check_id.as_str())), ("shipped", None)] {
        let req = guitar_works_mes::api::BatchApi::transition_request(
            &batch_id, target, "mgr01", gate,
        );
        state.batch_api.transition(&req).unwrap();
    }

    assert!(state
        .batch_api
        .list_open_batches()
        .unwrap()
        .iter()
        .all(|b| b.batch_id != batch_id));
}

#[test]
fn test_allowed_destinations() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-B040");

    // 入口工序只有一条去向, 无闸口
    let dests = state.batch_api.allowed_destinations(&batch_id).unwrap();
    assert_eq!(dests.len(), 1);
    assert_eq!(dests[0].to_stage, "sanding");
    assert!(!dests[0].requires_quality_gate);

    // acoustic_qc 有两条去向: 过闸口去包装, 或返工回砂光
    test_helpers::advance_batch_to(&state, &batch_id, "acoustic_qc");
    let mut dests = state.batch_api.allowed_destinations(&batch_id).unwrap();
    dests.sort_by(|a, b| a.to_stage.cmp(&b.to_stage));
    assert_eq!(dests.len(), 2);
    assert_eq!(dests[0].to_stage, "packaging");
    assert!(dests[0].requires_quality_gate);
    assert_eq!(dests[1].to_stage, "sanding");
    assert!(!dests[1].requires_quality_gate);
}

#[test]
fn test_get_batch_not_found() {
    let (_tmp, state) = setup_test_env();
    let err = state.batch_api.get_batch("nope").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
