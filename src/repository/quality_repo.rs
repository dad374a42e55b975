// ==========================================
// 吉他工坊生产执行系统 - 质检仓储
// ==========================================

use crate::domain::quality::QualityCheck;
use crate::domain::types::{QualityOutcome, StageCode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct QualityCheckRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QualityCheckRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<QualityCheck> {
        let outcome_str: String = row.get(3)?;
        let resolved_at: Option<String> = row.get(7)?;
        let created_at: String = row.get(8)?;
        Ok(QualityCheck {
            check_id: row.get(0)?,
            batch_id: row.get(1)?,
            stage_code: StageCode::new(row.get::<_, String>(2)?),
            outcome: QualityOutcome::from_str(&outcome_str).unwrap_or(QualityOutcome::Hold),
            notes: row.get(4)?,
            inspector: row.get(5)?,
            resolved_by: row.get(6)?,
            resolved_at: resolved_at.map(|s| parse_ts(&s)),
            created_at: parse_ts(&created_at),
        })
    }

    const SELECT_COLS: &'static str = "check_id, batch_id, stage_code, outcome, notes, \
         inspector, resolved_by, resolved_at, created_at";

    /// 插入质检记录
    pub fn insert(&self, check: &QualityCheck) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO quality_checks (
                check_id, batch_id, stage_code, outcome, notes,
                inspector, resolved_by, resolved_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                check.check_id,
                check.batch_id,
                check.stage_code.as_str(),
                check.outcome.as_str(),
                check.notes,
                check.inspector,
                check.resolved_by,
                check
                    .resolved_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                check.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(check.check_id.clone())
    }

    /// 按ID查询质检记录
    pub fn find_by_id(&self, check_id: &str) -> RepositoryResult<Option<QualityCheck>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "SELECT {} FROM quality_checks WHERE check_id = ?",
                Self::SELECT_COLS
            ),
            params![check_id],
            |row| Self::map_row(row),
        ) {
            Ok(check) => Ok(Some(check)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询批次在指定工序的最新质检记录
    pub fn find_latest_for(
        &self,
        batch_id: &str,
        stage: &StageCode,
    ) -> RepositoryResult<Option<QualityCheck>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {} FROM quality_checks
                   WHERE batch_id = ? AND stage_code = ?
                   ORDER BY created_at DESC, check_id DESC LIMIT 1"#,
                Self::SELECT_COLS
            ),
            params![batch_id, stage.as_str()],
            |row| Self::map_row(row),
        ) {
            Ok(check) => Ok(Some(check)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询批次全部质检记录
    pub fn find_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<QualityCheck>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM quality_checks WHERE batch_id = ? ORDER BY created_at",
            Self::SELECT_COLS
        ))?;

        let checks = stmt
            .query_map(params![batch_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<QualityCheck>, _>>()?;

        Ok(checks)
    }

    /// 将质检问题标记为已解决 (结论改为 pass, 记录处理人/备注/时间)
    ///
    /// # 约束
    /// 仅允许处理未解决的记录; 已解决的再次 resolve 返回 NotFound
    /// (WHERE resolved_at IS NULL 保证幂等冲突可见)
    pub fn resolve(
        &self,
        check_id: &str,
        resolution_notes: &str,
        resolver_id: &str,
    ) -> RepositoryResult<QualityCheck> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE quality_checks
               SET outcome = 'pass',
                   notes = COALESCE(notes || char(10), '') || ?1,
                   resolved_by = ?2,
                   resolved_at = datetime('now')
               WHERE check_id = ?3 AND resolved_at IS NULL"#,
            params![resolution_notes, resolver_id, check_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "QualityCheck(unresolved)".to_string(),
                id: check_id.to_string(),
            });
        }
        drop(conn);

        self.find_by_id(check_id)?.ok_or(RepositoryError::NotFound {
            entity: "QualityCheck".to_string(),
            id: check_id.to_string(),
        })
    }
}
