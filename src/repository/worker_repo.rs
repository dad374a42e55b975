// ==========================================
// 吉他工坊生产执行系统 - 员工仓储
// ==========================================
// 红线: Repository 不做业务逻辑, 只做数据映射
// ==========================================

use crate::domain::types::Role;
use crate::domain::worker::Worker;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct WorkerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Worker> {
        let role_str: String = row.get(2)?;
        let created_at: String = row.get(4)?;
        Ok(Worker {
            worker_id: row.get(0)?,
            name: row.get(1)?,
            role: Role::from_str(&role_str).unwrap_or(Role::Worker),
            active: row.get::<_, i64>(3)? != 0,
            created_at: parse_ts(&created_at),
        })
    }

    /// 插入员工
    pub fn insert(&self, worker: &Worker) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO workers (worker_id, name, role, active, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                worker.worker_id,
                worker.name,
                worker.role.as_str(),
                worker.active as i64,
                worker.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(worker.worker_id.clone())
    }

    /// 按ID查询员工
    pub fn find_by_id(&self, worker_id: &str) -> RepositoryResult<Option<Worker>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT worker_id, name, role, active, created_at
               FROM workers WHERE worker_id = ?"#,
            params![worker_id],
            |row| Self::map_row(row),
        ) {
            Ok(worker) => Ok(Some(worker)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部在职员工
    pub fn list_active(&self) -> RepositoryResult<Vec<Worker>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT worker_id, name, role, active, created_at
               FROM workers WHERE active = 1 ORDER BY name"#,
        )?;

        let workers = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<Worker>, _>>()?;

        Ok(workers)
    }
}

/// 解析 TEXT 时间戳 (兼容 datetime('now') 与格式化写入)
pub(crate) fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.naive_utc())
}
