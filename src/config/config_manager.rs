// ==========================================
// 吉他工坊生产执行系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 通知开关配置键
pub const KEY_NOTIFY_ON_COMPLETE: &str = "notify/assignment_complete";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取布尔配置 ("true"/"1" 为真)，带默认值
    pub fn get_bool_or_default(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        Ok(match self.get_config_value(key)? {
            Some(v) => matches!(v.as_str(), "true" | "1"),
            None => default,
        })
    }

    /// 写入 global scope 配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 完工通知开关 (默认开启)
    pub fn notify_on_assignment_complete(&self) -> bool {
        self.get_bool_or_default(KEY_NOTIFY_ON_COMPLETE, true)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn manager_on_memory_db() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_get_missing_key_returns_default() {
        let mgr = manager_on_memory_db();
        assert_eq!(
            mgr.get_config_or_default("no/such/key", "fallback").unwrap(),
            "fallback"
        );
        assert!(mgr.notify_on_assignment_complete());
    }

    #[test]
    fn test_set_then_get() {
        let mgr = manager_on_memory_db();
        mgr.set_global_config_value(KEY_NOTIFY_ON_COMPLETE, "false")
            .unwrap();
        assert!(!mgr.notify_on_assignment_complete());

        // 覆写
        mgr.set_global_config_value(KEY_NOTIFY_ON_COMPLETE, "1").unwrap();
        assert!(mgr.notify_on_assignment_complete());
    }
}
