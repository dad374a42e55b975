// ==========================================
// 吉他工坊生产执行系统 - 主入口
// ==========================================
// 说明: 启动时建库、加载流转图并打印系统概况;
//       业务请求通过库 API 接入 (外部服务层是独立部署物)
// ==========================================

use guitar_works_mes::app::{get_default_db_path, AppState};
use guitar_works_mes::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("吉他工坊生产执行系统 - 批次流转核心");
    tracing::info!("系统版本: {}", guitar_works_mes::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径 (可用命令行参数覆盖)
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("AppState初始化成功");
    tracing::info!("流转图: {} 个工序", app_state.graph.stage_count());

    match app_state.batch_api.list_open_batches() {
        Ok(batches) => tracing::info!("未完成批次: {} 个", batches.len()),
        Err(e) => tracing::warn!("批次查询失败: {}", e),
    }
}
