// ==========================================
// 吉他工坊生产执行系统 - 演示数据库重置与播种
// ==========================================
// 用途: 本地联调/验收用; 删除旧库, 重建 schema 并写入一套完整演示数据
// 用法: seed_demo_db [db_path]
// ==========================================

use guitar_works_mes::app::AppState;
use guitar_works_mes::config::stage_graph::seed_default_graph;
use guitar_works_mes::domain::types::{BatchPriority, Role};
use guitar_works_mes::domain::worker::Worker;
use guitar_works_mes::{db, logging};

fn main() {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demo_mes.db".to_string());

    if std::path::Path::new(&db_path).exists() {
        tracing::info!("删除旧库: {}", db_path);
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::error!("旧库删除失败: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = seed(&db_path) {
        tracing::error!("播种失败: {}", e);
        std::process::exit(1);
    }

    tracing::info!("演示库已就绪: {}", db_path);
}

fn seed(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    {
        let conn = db::open_sqlite_connection(db_path)?;
        db::init_schema(&conn)?;
        seed_default_graph(&conn)?;
    }

    let state = AppState::new(db_path.to_string())?;

    // 员工: 管理员 / 主管 / 两名工人
    let workers = [
        ("admin01", "系统管理员", Role::Admin),
        ("mgr01", "王主管", Role::Manager),
        ("w01", "张师傅", Role::Worker),
        ("w02", "李师傅", Role::Worker),
    ];
    for (id, name, role) in workers {
        state
            .worker_repo
            .insert(&Worker::new(id.to_string(), name.to_string(), role))?;
    }
    tracing::info!("员工已写入: {} 人", workers.len());

    // 订单: 三张演示订单
    let csv = "order_no,model,customer_name,due_date\n\
               SO-1001,OM-28,琴行A,2026-10-15\n\
               SO-1002,D-18,琴行B,2026-11-01\n\
               SO-1003,000-15M,散客C,\n";
    let csv_path = std::env::temp_dir().join("seed_orders.csv");
    std::fs::write(&csv_path, csv)?;
    let report = state.order_api.import_orders(&csv_path, "mgr01")?;
    tracing::info!("订单已导入: {} 张", report.imported);

    // 批次: 全部订单并成一批, 高优先级
    let order_ids: Vec<String> = state
        .order_api
        .list_orders()?
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    let batch = state
        .batch_api
        .create_batch("B-2026-0001", order_ids, BatchPriority::High, "mgr01")?;
    tracing::info!("批次已创建: {} ({})", batch.batch_no, batch.batch_id);

    // 往前推两道工序, 留出演示空间
    for target in ["sanding", "finishing"] {
        let req = guitar_works_mes::api::BatchApi::transition_request(
            &batch.batch_id,
            target,
            "mgr01",
            None,
        );
        state.batch_api.transition(&req)?;
    }
    tracing::info!("批次已推进至 finishing");

    Ok(())
}
