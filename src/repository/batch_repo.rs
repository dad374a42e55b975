// ==========================================
// 吉他工坊生产执行系统 - 批次仓储
// ==========================================
// 职责: 批次CRUD + 工序流转的原子提交
// 并发控制: current_stage 上的CAS更新, 失败返回 StageConflict
// 红线: 流转写入与审计写入必须同事务, 不允许只落一半
// ==========================================

use crate::domain::audit_log::AuditLogEntry;
use crate::domain::batch::Batch;
use crate::domain::types::{BatchPriority, StageCode};
use crate::repository::audit_log_repo::insert_audit_on;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct BatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Batch> {
        let priority_str: String = row.get(3)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;
        Ok(Batch {
            batch_id: row.get(0)?,
            batch_no: row.get(1)?,
            current_stage: StageCode::new(row.get::<_, String>(2)?),
            priority: BatchPriority::from_str(&priority_str).unwrap_or(BatchPriority::Standard),
            completed: row.get::<_, i64>(4)? != 0,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
            order_ids: vec![],
        })
    }

    const SELECT_COLS: &'static str =
        "batch_id, batch_no, current_stage, priority, completed, created_at, updated_at";

    /// 创建批次及其成员订单 (单事务) 并落审计
    pub fn create_with_orders(
        &self,
        batch: &Batch,
        audit: &AuditLogEntry,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO batches (
                batch_id, batch_no, current_stage, priority, completed, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                batch.batch_id,
                batch.batch_no,
                batch.current_stage.as_str(),
                batch.priority.as_str(),
                batch.completed as i64,
                batch.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                batch.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        for (position, order_id) in batch.order_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO batch_orders (batch_id, order_id, position) VALUES (?, ?, ?)",
                params![batch.batch_id, order_id, position as i64],
            )?;
        }

        insert_audit_on(&tx, audit)?;

        tx.commit()?;
        Ok(batch.batch_id.clone())
    }

    /// 按ID查询批次 (含成员订单, 按 position 排序)
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;

        let batch = match conn.query_row(
            &format!("SELECT {} FROM batches WHERE batch_id = ?", Self::SELECT_COLS),
            params![batch_id],
            |row| Self::map_row(row),
        ) {
            Ok(batch) => batch,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            "SELECT order_id FROM batch_orders WHERE batch_id = ? ORDER BY position",
        )?;
        let order_ids = stmt
            .query_map(params![batch_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(batch.with_orders(order_ids)))
    }

    /// 按批次号查询
    pub fn find_by_batch_no(&self, batch_no: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;

        let batch_id: Option<String> = match conn.query_row(
            "SELECT batch_id FROM batches WHERE batch_no = ?",
            params![batch_no],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
        drop(conn);

        match batch_id {
            Some(id) => self.find_by_id(&id),
            None => Ok(None),
        }
    }

    /// 查询全部未完成批次 (优先级高者在前)
    pub fn list_open(&self) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM batches WHERE completed = 0
               ORDER BY CASE priority
                   WHEN 'urgent' THEN 0
                   WHEN 'high' THEN 1
                   WHEN 'standard' THEN 2
                   ELSE 3
               END, created_at"#,
            Self::SELECT_COLS
        ))?;

        let batches = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<Batch>, _>>()?;

        Ok(batches)
    }

    // ==========================================
    // 工序流转提交 (核心写路径)
    // ==========================================

    /// 原子提交一次工序流转
    ///
    /// # 并发控制
    /// UPDATE 带 current_stage = expected 条件 (CAS)。校验与写入之间若有
    /// 其他调用方改走了批次, rows_affected = 0, 整个事务回滚并返回
    /// `StageConflict` (错误信息里带提交时刻的实际工序)。
    ///
    /// # 原子性
    /// 批次更新与审计插入在同一事务内提交; 任何一步失败都不落库。
    ///
    /// # 参数
    /// - expected_stage: 校验时读到的当前工序
    /// - target_stage: 目标工序
    /// - mark_completed: 目标为终点工序时置位
    /// - audit: 本次流转的审计日志
    pub fn commit_transition(
        &self,
        batch_id: &str,
        expected_stage: &StageCode,
        target_stage: &StageCode,
        mark_completed: bool,
        audit: &AuditLogEntry,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows_affected = tx.execute(
            r#"UPDATE batches
               SET current_stage = ?1,
                   completed = CASE WHEN ?2 THEN 1 ELSE completed END,
                   updated_at = datetime('now')
               WHERE batch_id = ?3 AND current_stage = ?4"#,
            params![
                target_stage.as_str(),
                mark_completed,
                batch_id,
                expected_stage.as_str(),
            ],
        )?;

        if rows_affected == 0 {
            // CAS失败: 读出实际工序用于错误说明, 再回滚
            let actual: Option<String> = match tx.query_row(
                "SELECT current_stage FROM batches WHERE batch_id = ?",
                params![batch_id],
                |row| row.get(0),
            ) {
                Ok(s) => Some(s),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };
            tx.rollback()?;

            return match actual {
                Some(actual) => Err(RepositoryError::StageConflict {
                    batch_id: batch_id.to_string(),
                    expected: expected_stage.to_string(),
                    actual,
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "Batch".to_string(),
                    id: batch_id.to_string(),
                }),
            };
        }

        insert_audit_on(&tx, audit)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
