// ==========================================
// 吉他工坊生产执行系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例 (组合根)
// 说明: 所有仓储共享同一个连接 (Arc<Mutex>); 流转图在启动时加载并校验一次
// ==========================================

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::api::{AssignmentApi, AuditApi, BatchApi, OrderApi, QualityApi};
use crate::config::config_manager::ConfigManager;
use crate::config::stage_graph::StageGraph;
use crate::db;
use crate::engine::assignment::AssignmentEngine;
use crate::engine::events::DbNotificationSink;
use crate::engine::quality::QualityGateEngine;
use crate::engine::transition::StageTransitionEngine;
use crate::repository::{
    AssignmentRepository, AuditLogRepository, BatchRepository, NotificationRepository,
    OrderRepository, QualityCheckRepository, WorkerRepository,
};
use crate::importer::order_importer::OrderImporter;

/// 默认数据库路径 (数据目录下 guitar-works-mes/mes.db)
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("guitar-works-mes");
    let _ = std::fs::create_dir_all(&dir);
    dir.join("mes.db").to_string_lossy().to_string()
}

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 工序流转图 (启动时加载)
    pub graph: Arc<StageGraph>,

    /// 批次API (含工序流转)
    pub batch_api: Arc<BatchApi>,
    /// 派工API
    pub assignment_api: Arc<AssignmentApi>,
    /// 质检API
    pub quality_api: Arc<QualityApi>,
    /// 订单API
    pub order_api: Arc<OrderApi>,
    /// 审计API
    pub audit_api: Arc<AuditApi>,

    /// 员工仓储 (身份解析入口)
    pub worker_repo: Arc<WorkerRepository>,
    /// 通知仓储 (查询用)
    pub notification_repo: Arc<NotificationRepository>,
}

impl AppState {
    /// 打开数据库并组装全部 API
    ///
    /// # 步骤
    /// 1. 打开连接 + 统一 PRAGMA + 建表 (幂等)
    /// 2. 加载并校验工序流转图 (失败即启动失败)
    /// 3. 组装仓储 -> 引擎 -> API
    pub fn new(db_path: String) -> Result<Self, Box<dyn Error>> {
        let conn = db::open_sqlite_connection(&db_path)?;
        db::init_schema(&conn)?;

        // 空库时写入默认流转图; 已有配置 (包括人工裁剪过的) 不动
        let stage_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM production_stage", [], |row| row.get(0))?;
        if stage_count == 0 {
            tracing::info!("production_stage 为空, 写入默认吉他工序流转图");
            crate::config::stage_graph::seed_default_graph(&conn)?;
        }

        if let Some(version) = db::read_schema_version(&conn)? {
            if version != db::CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    found = version,
                    expected = db::CURRENT_SCHEMA_VERSION,
                    "schema_version 与代码期望不一致"
                );
            }
        }

        let graph = Arc::new(StageGraph::load(&conn)?);
        let conn = Arc::new(Mutex::new(conn));

        Self::with_connection(db_path, conn, graph)
    }

    /// 从已有连接组装 (测试用)
    pub fn with_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        graph: Arc<StageGraph>,
    ) -> Result<Self, Box<dyn Error>> {
        let worker_repo = Arc::new(WorkerRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let batch_repo = Arc::new(BatchRepository::new(conn.clone()));
        let quality_repo = Arc::new(QualityCheckRepository::new(conn.clone()));
        let assignment_repo = Arc::new(AssignmentRepository::new(conn.clone()));
        let audit_repo = Arc::new(AuditLogRepository::new(conn.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(conn.clone()));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let notification_sink = Arc::new(DbNotificationSink::new(notification_repo.clone()));

        let transition_engine = Arc::new(StageTransitionEngine::new(
            worker_repo.clone(),
            batch_repo.clone(),
            quality_repo.clone(),
            graph.clone(),
        ));
        let assignment_engine = Arc::new(AssignmentEngine::new(
            worker_repo.clone(),
            batch_repo.clone(),
            assignment_repo.clone(),
            audit_repo.clone(),
            graph.clone(),
            config_manager.clone(),
            notification_sink,
        ));
        let quality_engine = Arc::new(QualityGateEngine::new(
            worker_repo.clone(),
            batch_repo.clone(),
            quality_repo.clone(),
            audit_repo.clone(),
            graph.clone(),
        ));
        let importer = Arc::new(OrderImporter::new(order_repo.clone()));

        let batch_api = Arc::new(BatchApi::new(
            worker_repo.clone(),
            order_repo.clone(),
            batch_repo.clone(),
            transition_engine,
            graph.clone(),
        ));
        let assignment_api = Arc::new(AssignmentApi::new(
            assignment_engine,
            assignment_repo.clone(),
        ));
        let quality_api = Arc::new(QualityApi::new(quality_engine, quality_repo.clone()));
        let order_api = Arc::new(OrderApi::new(
            worker_repo.clone(),
            order_repo,
            audit_repo.clone(),
            importer,
        ));
        let audit_api = Arc::new(AuditApi::new(audit_repo));

        Ok(Self {
            db_path,
            graph,
            batch_api,
            assignment_api,
            quality_api,
            order_api,
            audit_api,
            worker_repo,
            notification_repo,
        })
    }
}
