// ==========================================
// 吉他工坊生产执行系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建库入口（init_schema），测试与生产共用同一套 DDL
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 表清单：
/// - workers: 员工主数据（角色即权限来源）
/// - orders / batches / batch_orders: 订单与批次
/// - production_stage / stage_transition: 工序查找表 + 流转图（数据驱动）
/// - quality_checks: 质检记录
/// - stage_assignments: 工序派工
/// - audit_log: 审计日志（只追加，seq 保证顺序）
/// - notifications: 员工通知（尽力而为旁路）
/// - config_scope / config_kv: 系统配置
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS workers (
            worker_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('worker', 'manager', 'admin')),
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS orders (
            order_id TEXT PRIMARY KEY,
            order_no TEXT NOT NULL UNIQUE,
            model TEXT NOT NULL,
            customer_name TEXT NOT NULL,
            due_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS production_stage (
            stage_code TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            is_terminal INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS stage_transition (
            from_stage TEXT NOT NULL REFERENCES production_stage(stage_code),
            to_stage TEXT NOT NULL REFERENCES production_stage(stage_code),
            requires_quality_gate INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (from_stage, to_stage)
        );

        CREATE TABLE IF NOT EXISTS batches (
            batch_id TEXT PRIMARY KEY,
            batch_no TEXT NOT NULL UNIQUE,
            current_stage TEXT NOT NULL REFERENCES production_stage(stage_code),
            priority TEXT NOT NULL DEFAULT 'standard'
                CHECK (priority IN ('low', 'standard', 'high', 'urgent')),
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS batch_orders (
            batch_id TEXT NOT NULL REFERENCES batches(batch_id) ON DELETE CASCADE,
            order_id TEXT NOT NULL REFERENCES orders(order_id),
            position INTEGER NOT NULL,
            PRIMARY KEY (batch_id, order_id),
            UNIQUE (batch_id, position)
        );

        CREATE TABLE IF NOT EXISTS quality_checks (
            check_id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL REFERENCES batches(batch_id),
            stage_code TEXT NOT NULL REFERENCES production_stage(stage_code),
            outcome TEXT NOT NULL CHECK (outcome IN ('pass', 'fail', 'hold')),
            notes TEXT,
            inspector TEXT NOT NULL,
            resolved_by TEXT,
            resolved_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stage_assignments (
            assignment_id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL REFERENCES batches(batch_id),
            stage_code TEXT NOT NULL REFERENCES production_stage(stage_code),
            worker_id TEXT NOT NULL REFERENCES workers(worker_id),
            assigned_by TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            completed_at TEXT,
            quality_status TEXT,
            time_spent_minutes INTEGER
        );

        -- 同一 (批次, 工序) 最多一条未完成派工
        CREATE UNIQUE INDEX IF NOT EXISTS idx_open_assignment
            ON stage_assignments(batch_id, stage_code)
            WHERE completed_at IS NULL;

        CREATE TABLE IF NOT EXISTS audit_log (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            audit_id TEXT NOT NULL UNIQUE,
            batch_id TEXT,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            from_stage TEXT,
            to_stage TEXT,
            quality_check_id TEXT,
            payload_json TEXT,
            detail TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_batch ON audit_log(batch_id, seq);

        CREATE TABLE IF NOT EXISTS notifications (
            notification_id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL REFERENCES workers(worker_id),
            title TEXT NOT NULL,
            body TEXT,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不应报错
        init_schema(&conn).unwrap();

        let version = read_schema_version(&conn).unwrap();
        assert_eq!(version, Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        let version = read_schema_version(&conn).unwrap();
        assert_eq!(version, None);
    }
}
