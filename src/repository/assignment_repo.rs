// ==========================================
// 吉他工坊生产执行系统 - 派工仓储
// ==========================================
// 约束: idx_open_assignment 部分唯一索引保证同 (批次, 工序) 只有一条未完成派工;
//       插入撞索引时映射为 UniqueConstraintViolation, 由引擎层转成派工冲突
// ==========================================

use crate::domain::assignment::StageAssignment;
use crate::domain::types::StageCode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<StageAssignment> {
        let started_at: String = row.get(5)?;
        let completed_at: Option<String> = row.get(6)?;
        Ok(StageAssignment {
            assignment_id: row.get(0)?,
            batch_id: row.get(1)?,
            stage_code: StageCode::new(row.get::<_, String>(2)?),
            worker_id: row.get(3)?,
            assigned_by: row.get(4)?,
            started_at: parse_ts(&started_at),
            completed_at: completed_at.map(|s| parse_ts(&s)),
            quality_status: row.get(7)?,
            time_spent_minutes: row.get(8)?,
        })
    }

    const SELECT_COLS: &'static str = "assignment_id, batch_id, stage_code, worker_id, \
         assigned_by, started_at, completed_at, quality_status, time_spent_minutes";

    /// 插入派工
    ///
    /// 同 (批次, 工序) 已有未完成派工时返回 UniqueConstraintViolation
    pub fn insert(&self, assignment: &StageAssignment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO stage_assignments (
                assignment_id, batch_id, stage_code, worker_id, assigned_by,
                started_at, completed_at, quality_status, time_spent_minutes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                assignment.assignment_id,
                assignment.batch_id,
                assignment.stage_code.as_str(),
                assignment.worker_id,
                assignment.assigned_by,
                assignment.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                assignment
                    .completed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                assignment.quality_status,
                assignment.time_spent_minutes,
            ],
        )?;

        Ok(assignment.assignment_id.clone())
    }

    /// 按ID查询派工
    pub fn find_by_id(&self, assignment_id: &str) -> RepositoryResult<Option<StageAssignment>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "SELECT {} FROM stage_assignments WHERE assignment_id = ?",
                Self::SELECT_COLS
            ),
            params![assignment_id],
            |row| Self::map_row(row),
        ) {
            Ok(assignment) => Ok(Some(assignment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询 (批次, 工序) 上的未完成派工
    pub fn find_open(
        &self,
        batch_id: &str,
        stage: &StageCode,
    ) -> RepositoryResult<Option<StageAssignment>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {} FROM stage_assignments
                   WHERE batch_id = ? AND stage_code = ? AND completed_at IS NULL"#,
                Self::SELECT_COLS
            ),
            params![batch_id, stage.as_str()],
            |row| Self::map_row(row),
        ) {
            Ok(assignment) => Ok(Some(assignment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询员工的未完成派工
    pub fn find_open_by_worker(&self, worker_id: &str) -> RepositoryResult<Vec<StageAssignment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM stage_assignments
               WHERE worker_id = ? AND completed_at IS NULL
               ORDER BY started_at"#,
            Self::SELECT_COLS
        ))?;

        let assignments = stmt
            .query_map(params![worker_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<StageAssignment>, _>>()?;

        Ok(assignments)
    }

    /// 关闭派工 (填入完工时间/质量状态/耗时)
    ///
    /// 已关闭的派工再次关闭返回 NotFound (WHERE completed_at IS NULL)
    pub fn complete(
        &self,
        assignment_id: &str,
        quality_status: &str,
        time_spent_minutes: i32,
    ) -> RepositoryResult<StageAssignment> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE stage_assignments
               SET completed_at = datetime('now'),
                   quality_status = ?1,
                   time_spent_minutes = ?2
               WHERE assignment_id = ?3 AND completed_at IS NULL"#,
            params![quality_status, time_spent_minutes, assignment_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "StageAssignment(open)".to_string(),
                id: assignment_id.to_string(),
            });
        }
        drop(conn);

        self.find_by_id(assignment_id)?
            .ok_or(RepositoryError::NotFound {
                entity: "StageAssignment".to_string(),
                id: assignment_id.to_string(),
            })
    }
}
