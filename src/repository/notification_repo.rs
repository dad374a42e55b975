// ==========================================
// 吉他工坊生产执行系统 - 通知仓储
// ==========================================
// 说明: 通知是尽力而为旁路, 写失败由调用方记日志, 不参与流转事务
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 员工通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub worker_id: String,
    pub title: String,
    pub body: Option<String>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl Notification {
    pub fn new(worker_id: String, title: String, body: Option<String>) -> Self {
        Self {
            notification_id: uuid::Uuid::new_v4().to_string(),
            worker_id,
            title,
            body,
            read: false,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

pub struct NotificationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotificationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Notification> {
        let created_at: String = row.get(5)?;
        Ok(Notification {
            notification_id: row.get(0)?,
            worker_id: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            read: row.get::<_, i64>(4)? != 0,
            created_at: parse_ts(&created_at),
        })
    }

    /// 插入通知
    pub fn insert(&self, notification: &Notification) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO notifications (
                notification_id, worker_id, title, body, read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                notification.notification_id,
                notification.worker_id,
                notification.title,
                notification.body,
                notification.read as i64,
                notification
                    .created_at
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ],
        )?;

        Ok(notification.notification_id.clone())
    }

    /// 查询员工的未读通知 (新的在前)
    pub fn list_unread(&self, worker_id: &str) -> RepositoryResult<Vec<Notification>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT notification_id, worker_id, title, body, read, created_at
               FROM notifications
               WHERE worker_id = ? AND read = 0
               ORDER BY created_at DESC"#,
        )?;

        let notifications = stmt
            .query_map(params![worker_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<Notification>, _>>()?;

        Ok(notifications)
    }

    /// 标记已读
    pub fn mark_read(&self, notification_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE notifications SET read = 1 WHERE notification_id = ?",
            params![notification_id],
        )?;
        Ok(())
    }
}
