// ==========================================
// 端到端集成测试
// ==========================================
// 场景: 接单 -> 组批 -> 派工 -> 逐工序流转 (含返工与闸口) -> 发货
// 最后用审计日志回放整条工序轨迹
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use guitar_works_mes::api::BatchApi;
use guitar_works_mes::domain::types::BatchPriority;
use std::io::Write;
use test_helpers::setup_test_env;

#[test]
fn test_full_batch_lifecycle_with_rework() {
    let (_tmp, state) = setup_test_env();

    // ===== 接单 =====
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    csv.write_all(
        "order_no,model,customer_name,due_date\n\
         SO-9001,OM-28,青山琴行,2026-11-20\n\
         SO-9002,OM-28,青山琴行,2026-11-20\n"
            .as_bytes(),
    )
    .unwrap();
    csv.flush().unwrap();
    let report = state.order_api.import_orders(csv.path(), "mgr01").unwrap();
    assert_eq!(report.imported, 2);

    // ===== 组批 =====
    let order_ids: Vec<String> = state
        .order_api
        .list_orders()
        .unwrap()
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    let batch = state
        .batch_api
        .create_batch("B-E2E-01", order_ids, BatchPriority::High, "mgr01")
        .unwrap();
    let batch_id = batch.batch_id;
    assert_eq!(batch.current_stage, "intake");

    // ===== 派工 + 正向流转到声学检验 =====
    let assignment = state
        .assignment_api
        .assign(&batch_id, "w01", "sanding", "mgr01")
        .unwrap();

    for target in ["sanding", "finishing", "sub_assembly", "final_assembly", "acoustic_qc"] {
        let req = BatchApi::transition_request(&batch_id, target, "mgr01", None);
        state.batch_api.transition(&req).unwrap();
    }

    state
        .assignment_api
        .complete(&assignment.assignment_id, "w01", "良好", 240)
        .unwrap();

    // ===== 首检不合格, 走返工边回砂光 =====
    let failed = state
        .quality_api
        .record(&batch_id, "acoustic_qc", "fail", Some("三弦打品".to_string()), "w02")
        .unwrap();
    let req = BatchApi::transition_request(&batch_id, "sanding", "mgr01", None);
    state.batch_api.transition(&req).unwrap();

    // ===== 返工后再次推进, 复检合格过闸口 =====
    for target in ["finishing", "sub_assembly", "final_assembly", "acoustic_qc"] {
        let req = BatchApi::transition_request(&batch_id, target, "mgr01", None);
        state.batch_api.transition(&req).unwrap();
    }
    state
        .quality_api
        .resolve(&failed.check_id, "调整品丝后复验合格", "mgr01")
        .unwrap();

    let req =
        BatchApi::transition_request(&batch_id, "packaging", "mgr01", Some(&failed.check_id));
    state.batch_api.transition(&req).unwrap();

    // ===== 发货 (终点工序) =====
    let req = BatchApi::transition_request(&batch_id, "shipped", "admin01", None);
    let batch = state.batch_api.transition(&req).unwrap();
    assert_eq!(batch.current_stage, "shipped");
    assert!(batch.completed);

    // ===== 审计回放: 流转日志按提交顺序还原整条轨迹 =====
    let history = state.audit_api.stage_history(&batch_id).unwrap();
    let replayed: Vec<(&str, &str)> = history
        .iter()
        .map(|e| {
            (
                e.from_stage.as_deref().unwrap(),
                e.to_stage.as_deref().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        replayed,
        vec![
            ("intake", "sanding"),
            ("sanding", "finishing"),
            ("finishing", "sub_assembly"),
            ("sub_assembly", "final_assembly"),
            ("final_assembly", "acoustic_qc"),
            ("acoustic_qc", "sanding"),
            ("sanding", "finishing"),
            ("finishing", "sub_assembly"),
            ("sub_assembly", "final_assembly"),
            ("final_assembly", "acoustic_qc"),
            ("acoustic_qc", "packaging"),
            ("packaging", "shipped"),
        ]
    );

    // 链式校验: 每条日志的起点等于上一条的终点
    for pair in replayed.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }

    // seq 全库单调递增
    let seqs: Vec<i64> = history.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));

    // 完整历史涵盖所有动作种类
    let full = state.audit_api.batch_history(&batch_id).unwrap();
    for action in [
        "BatchCreate",
        "StageTransition",
        "AssignmentCreate",
        "AssignmentComplete",
        "QualityRecord",
        "QualityResolve",
    ] {
        assert!(
            full.iter().any(|e| e.action == action),
            "缺少动作 {action} 的审计"
        );
    }
}
