// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use guitar_works_mes::app::AppState;
use guitar_works_mes::config::stage_graph::{seed_default_graph, StageGraph};
use guitar_works_mes::db;
use guitar_works_mes::domain::order::Order;
use guitar_works_mes::domain::types::{BatchPriority, Role};
use guitar_works_mes::domain::worker::Worker;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema + 默认流转图
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    seed_default_graph(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建完整测试环境: 临时库 + AppState + 标准员工四人组
///
/// 员工: admin01(admin), mgr01(manager), w01/w02(worker)
pub fn setup_test_env() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();

    let conn = db::open_sqlite_connection(&db_path).unwrap();
    let graph = Arc::new(StageGraph::load(&conn).unwrap());
    let state =
        AppState::with_connection(db_path, Arc::new(Mutex::new(conn)), graph).unwrap();

    seed_standard_workers(&state);

    (temp_file, state)
}

/// 写入标准员工四人组
pub fn seed_standard_workers(state: &AppState) {
    let workers = [
        ("admin01", "系统管理员", Role::Admin),
        ("mgr01", "王主管", Role::Manager),
        ("w01", "张师傅", Role::Worker),
        ("w02", "李师傅", Role::Worker),
    ];
    for (id, name, role) in workers {
        state
            .worker_repo
            .insert(&Worker::new(id.to_string(), name.to_string(), role))
            .unwrap();
    }
}

/// 快速建一张订单, 返回 order_id
pub fn seed_order(state: &AppState, order_no: &str) -> String {
    let order = Order::new(
        order_no.to_string(),
        "OM-28".to_string(),
        "测试琴行".to_string(),
    );
    let order_repo = guitar_works_mes::repository::OrderRepository::new(state_conn(state));
    order_repo.insert(&order).unwrap();
    order.order_id
}

/// 快速建一个批次 (单订单, 标准优先级, 入口工序), 返回 batch_id
pub fn seed_batch(state: &AppState, batch_no: &str) -> String {
    let order_id = seed_order(state, &format!("SO-{}", batch_no));
    let batch = state
        .batch_api
        .create_batch(batch_no, vec![order_id], BatchPriority::Standard, "mgr01")
        .unwrap();
    batch.batch_id
}

/// 把批次沿默认正向链推进到指定工序 (无闸口段)
pub fn advance_batch_to(state: &AppState, batch_id: &str, target: &str) {
    let chain = [
        "sanding",
        "finishing",
        "sub_assembly",
        "final_assembly",
        "acoustic_qc",
    ];
    for stage in chain {
        let req = guitar_works_mes::api::BatchApi::transition_request(
            batch_id, stage, "mgr01", None,
        );
        state.batch_api.transition(&req).unwrap();
        if stage == target {
            return;
        }
    }
    panic!("target stage {} 不在无闸口推进链上", target);
}

/// 取 AppState 底层连接 (测试直查数据库用)
///
/// 说明: AppState 的仓储共享一个连接; 这里重新打开同一文件即可
pub fn state_conn(state: &AppState) -> Arc<Mutex<Connection>> {
    let conn = db::open_sqlite_connection(&state.db_path).unwrap();
    Arc::new(Mutex::new(conn))
}
