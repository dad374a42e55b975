// ==========================================
// 并发流转控制测试
// ==========================================
// 职责: 验证 CAS 提交在并发写入下只允许一个赢家, 且审计不重复
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use guitar_works_mes::api::{ApiError, BatchApi};
use guitar_works_mes::app::AppState;
use guitar_works_mes::config::stage_graph::StageGraph;
use guitar_works_mes::db;
use guitar_works_mes::domain::audit_log::AuditLogEntry;
use guitar_works_mes::domain::types::StageCode;
use guitar_works_mes::repository::{BatchRepository, RepositoryError};
use std::sync::{Arc, Barrier, Mutex};
use test_helpers::{seed_batch, setup_test_env, state_conn};

/// 确定性过期写: 校验时读到的工序在提交前被别人改走
#[test]
fn test_stale_commit_returns_stage_conflict() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-C001");

    // 模拟另一操作人先把批次推到 sanding
    let req = BatchApi::transition_request(&batch_id, "sanding", "mgr01", None);
    state.batch_api.transition(&req).unwrap();

    // 以校验时的旧工序 intake 提交 -> CAS 失败
    let repo = BatchRepository::new(state_conn(&state));
    let audit = AuditLogEntry::stage_transition(
        batch_id.clone(),
        "mgr01".to_string(),
        "intake",
        "sanding",
        None,
    );
    let err = repo
        .commit_transition(
            &batch_id,
            &StageCode::from("intake"),
            &StageCode::from("sanding"),
            false,
            &audit,
        )
        .unwrap_err();

    match err {
        RepositoryError::StageConflict {
            batch_id: b,
            expected,
            actual,
        } => {
            assert_eq!(b, batch_id);
            assert_eq!(expected, "intake");
            assert_eq!(actual, "sanding");
        }
        other => panic!("expected StageConflict, got {other:?}"),
    }

    // 失败的提交整体回滚: 只有最初那一次流转留下审计
    let history = state.audit_api.stage_history(&batch_id).unwrap();
    assert_eq!(history.len(), 1);
}

/// 双线程同时把同一批次推向不同目标, 必须恰好一个成功
///
/// 场景: 批次停在 acoustic_qc, 两条合法去向 —
/// 过闸口去 packaging, 或走返工边回 sanding
#[test]
fn test_two_writers_different_targets_exactly_one_wins() {
    let (_tmp, state) = setup_test_env();
    let batch_id = seed_batch(&state, "B-C002");
    test_helpers::advance_batch_to(&state, &batch_id, "acoustic_qc");

    let check = state
        .quality_api
        .record(&batch_id, "acoustic_qc", "pass", None, "w01")
        .unwrap();
    let transitions_before = state.audit_api.stage_history(&batch_id).unwrap().len();

    let db_path = state.db_path.clone();
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();

    for target in ["packaging", "sanding"] {
        let barrier = barrier.clone();
        let db_path = db_path.clone();
        let batch_id = batch_id.clone();
        let gate = (target == "packaging").then(|| check.check_id.clone());

        handles.push(std::thread::spawn(move || {
            // 每个写入方持有自己的连接 (busy_timeout 兜底串行化)
            let conn = db::open_sqlite_connection(&db_path).unwrap();
            let graph = Arc::new(StageGraph::load(&conn).unwrap());
            let state =
                AppState::with_connection(db_path, Arc::new(Mutex::new(conn)), graph).unwrap();

            let req = BatchApi::transition_request(&batch_id, target, "mgr01", gate.as_deref());
            barrier.wait();
            state.batch_api.transition(&req)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins: Vec<&str> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|b| b.current_stage.as_str())
        .collect();
    assert_eq!(wins.len(), 1, "并发流转必须恰好一个赢家");

    // 输家要么提交时撞 CAS, 要么校验时已看到新工序
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, ApiError::Conflict(_) | ApiError::InvalidTransition { .. }),
                "意外的失败种类: {e:?}"
            );
        }
    }

    // 终态一致: 批次停在赢家的目标工序, 且只新增一条流转审计
    let batch = state.batch_api.get_batch(&batch_id).unwrap();
    assert_eq!(batch.current_stage, wins[0]);
    let history = state.audit_api.stage_history(&batch_id).unwrap();
    assert_eq!(history.len(), transitions_before + 1);
}
