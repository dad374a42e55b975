// ==========================================
// 吉他工坊生产执行系统 - 审计日志仓储
// ==========================================
// 红线: 只有 INSERT 和 SELECT; 不提供 UPDATE/DELETE
// 顺序保证: seq (AUTOINCREMENT) 与提交顺序一致, 按批次回放即得工序历史
// ==========================================

use crate::domain::audit_log::AuditLogEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 在给定连接/事务上插入审计日志
///
/// 说明: 提供自由函数是为了让流转提交能把审计插入挂进自己的事务
/// (batch_repo::commit_transition), 保证"批次更新与审计同生共死"。
pub(crate) fn insert_audit_on(conn: &Connection, entry: &AuditLogEntry) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO audit_log (
            audit_id, batch_id, actor, action, from_stage, to_stage,
            quality_check_id, payload_json, detail, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            entry.audit_id,
            entry.batch_id,
            entry.actor,
            entry.action,
            entry.from_stage,
            entry.to_stage,
            entry.quality_check_id,
            entry.payload_json.as_ref().map(|v| v.to_string()),
            entry.detail,
            entry.created_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        ],
    )?;
    Ok(())
}

pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<AuditLogEntry> {
        let payload: Option<String> = row.get(8)?;
        let created_at: String = row.get(10)?;
        Ok(AuditLogEntry {
            seq: Some(row.get(0)?),
            audit_id: row.get(1)?,
            batch_id: row.get(2)?,
            actor: row.get(3)?,
            action: row.get(4)?,
            from_stage: row.get(5)?,
            to_stage: row.get(6)?,
            quality_check_id: row.get(7)?,
            payload_json: payload.and_then(|p| serde_json::from_str(&p).ok()),
            detail: row.get(9)?,
            created_at: parse_ts_millis(&created_at),
        })
    }

    const SELECT_COLS: &'static str = "seq, audit_id, batch_id, actor, action, from_stage, \
         to_stage, quality_check_id, payload_json, detail, created_at";

    /// 插入审计日志
    pub fn insert(&self, entry: &AuditLogEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_audit_on(&conn, entry)?;
        Ok(entry.audit_id.clone())
    }

    /// 查询批次的全部审计日志 (按 seq 升序, 即提交顺序)
    pub fn find_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<AuditLogEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM audit_log WHERE batch_id = ? ORDER BY seq",
            Self::SELECT_COLS
        ))?;

        let entries = stmt
            .query_map(params![batch_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<AuditLogEntry>, _>>()?;

        Ok(entries)
    }

    /// 查询批次下指定操作类型的日志 (按 seq 升序)
    pub fn find_by_batch_and_action(
        &self,
        batch_id: &str,
        action: &str,
    ) -> RepositoryResult<Vec<AuditLogEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM audit_log WHERE batch_id = ? AND action = ? ORDER BY seq",
            Self::SELECT_COLS
        ))?;

        let entries = stmt
            .query_map(params![batch_id, action], |row| Self::map_row(row))?
            .collect::<Result<Vec<AuditLogEntry>, _>>()?;

        Ok(entries)
    }

    /// 最近的 N 条日志 (运维用, 按 seq 降序)
    pub fn recent(&self, limit: i64) -> RepositoryResult<Vec<AuditLogEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM audit_log ORDER BY seq DESC LIMIT ?",
            Self::SELECT_COLS
        ))?;

        let entries = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<AuditLogEntry>, _>>()?;

        Ok(entries)
    }
}

/// 解析带毫秒的 TEXT 时间戳 (兼容不带毫秒的历史数据)
fn parse_ts_millis(s: &str) -> chrono::NaiveDateTime {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f")
        .unwrap_or_else(|_| parse_ts(s))
}
