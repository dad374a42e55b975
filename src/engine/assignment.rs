// ==========================================
// 吉他工坊生产执行系统 - 派工引擎
// ==========================================
// 职责: 工序派工的创建与关闭
// 约束: 同 (批次, 工序) 最多一条未完成派工; 完工通知尽力而为
// ==========================================

use crate::config::config_manager::ConfigManager;
use crate::config::stage_graph::StageGraph;
use crate::domain::assignment::StageAssignment;
use crate::domain::audit_log::{AuditAction, AuditLogEntry};
use crate::domain::types::{Role, StageCode};
use crate::engine::access::{require_role, MANAGE_ROLES};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::events::NotificationSink;
use crate::repository::assignment_repo::AssignmentRepository;
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::batch_repo::BatchRepository;
use crate::repository::error::RepositoryError;
use crate::repository::worker_repo::WorkerRepository;
use serde_json::json;
use std::sync::Arc;

// ==========================================
// AssignmentEngine - 派工引擎
// ==========================================
pub struct AssignmentEngine {
    worker_repo: Arc<WorkerRepository>,
    batch_repo: Arc<BatchRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    audit_repo: Arc<AuditLogRepository>,
    graph: Arc<StageGraph>,
    config: Arc<ConfigManager>,
    notification_sink: Arc<dyn NotificationSink>,
}

impl AssignmentEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_repo: Arc<WorkerRepository>,
        batch_repo: Arc<BatchRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        audit_repo: Arc<AuditLogRepository>,
        graph: Arc<StageGraph>,
        config: Arc<ConfigManager>,
        notification_sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            worker_repo,
            batch_repo,
            assignment_repo,
            audit_repo,
            graph,
            config,
            notification_sink,
        }
    }

    /// 派工: 把员工指派到 (批次, 工序)
    ///
    /// # 规则
    /// - 操作人角色必须是 manager/admin
    /// - 批次、被派员工必须存在; 工序必须在流转图中
    /// - 同 (批次, 工序) 已有未完成派工 -> AssignmentConflict
    pub fn assign(
        &self,
        batch_id: &str,
        worker_id: &str,
        stage: &StageCode,
        acting_worker_id: &str,
    ) -> WorkflowResult<StageAssignment> {
        let actor = self.worker_repo.find_by_id(acting_worker_id)?;
        let actor = require_role(acting_worker_id, actor.as_ref(), MANAGE_ROLES)?;

        if !self.graph.contains(stage) {
            return Err(WorkflowError::UnknownStage(stage.to_string()));
        }

        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Batch".to_string(),
                id: batch_id.to_string(),
            })?;

        let assignee = self
            .worker_repo
            .find_by_id(worker_id)?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Worker".to_string(),
                id: worker_id.to_string(),
            })?;

        // 先查后插只是为了友好报错; 部分唯一索引兜底并发场景
        if self.assignment_repo.find_open(batch_id, stage)?.is_some() {
            return Err(WorkflowError::AssignmentConflict {
                batch_id: batch_id.to_string(),
                stage: stage.to_string(),
            });
        }

        let assignment = StageAssignment::new(
            batch.batch_id.clone(),
            stage.clone(),
            assignee.worker_id.clone(),
            actor.worker_id.clone(),
        );

        match self.assignment_repo.insert(&assignment) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(WorkflowError::AssignmentConflict {
                    batch_id: batch_id.to_string(),
                    stage: stage.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let audit = AuditLogEntry::new(
            Some(batch.batch_id.clone()),
            AuditAction::AssignmentCreate,
            actor.worker_id.clone(),
        )
        .with_payload(&json!({
            "assignment_id": assignment.assignment_id,
            "worker_id": assignee.worker_id,
            "stage": stage.as_str(),
        }));
        self.audit_repo.insert(&audit)?;

        tracing::info!(
            batch_id = %batch.batch_id,
            stage = %stage,
            worker = %assignee.worker_id,
            actor = %actor.worker_id,
            "派工已创建"
        );

        Ok(assignment)
    }

    /// 完工: 关闭派工并尽力而为地通知员工
    ///
    /// # 规则
    /// - 操作人必须是被派员工本人, 或 manager/admin
    /// - 通知失败只记 warn, 不影响返回
    pub fn complete(
        &self,
        assignment_id: &str,
        acting_worker_id: &str,
        quality_status: &str,
        time_spent_minutes: i32,
    ) -> WorkflowResult<StageAssignment> {
        let actor = self
            .worker_repo
            .find_by_id(acting_worker_id)?
            .ok_or_else(|| WorkflowError::Unauthorized {
                actor_id: acting_worker_id.to_string(),
            })?;

        let assignment = self
            .assignment_repo
            .find_by_id(assignment_id)?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "StageAssignment".to_string(),
                id: assignment_id.to_string(),
            })?;

        // 本人完工无需管理角色; 代人完工要求 manager/admin
        if actor.worker_id != assignment.worker_id {
            require_role(acting_worker_id, Some(&actor), MANAGE_ROLES)?;
        } else if !actor.active {
            return Err(WorkflowError::Forbidden {
                actor_id: actor.worker_id.clone(),
                role: format!("{}(inactive)", actor.role),
                required: Role::Worker.to_string(),
            });
        }

        let closed = self
            .assignment_repo
            .complete(assignment_id, quality_status, time_spent_minutes)?;

        let audit = AuditLogEntry::new(
            Some(closed.batch_id.clone()),
            AuditAction::AssignmentComplete,
            actor.worker_id.clone(),
        )
        .with_payload(&json!({
            "assignment_id": closed.assignment_id,
            "stage": closed.stage_code.as_str(),
            "quality_status": quality_status,
            "time_spent_minutes": time_spent_minutes,
        }));
        self.audit_repo.insert(&audit)?;

        // 尽力而为的完工通知
        if self.config.notify_on_assignment_complete() {
            let title = format!("工序 {} 完工确认", closed.stage_code);
            let body = format!(
                "批次 {} 的派工已关闭, 质量状态: {}",
                closed.batch_id, quality_status
            );
            if let Err(e) =
                self.notification_sink
                    .notify(&closed.worker_id, &title, Some(&body))
            {
                tracing::warn!(
                    assignment_id = %closed.assignment_id,
                    worker = %closed.worker_id,
                    error = %e,
                    "完工通知发送失败 (忽略)"
                );
            }
        }

        tracing::info!(
            assignment_id = %closed.assignment_id,
            batch_id = %closed.batch_id,
            actor = %actor.worker_id,
            "派工已关闭"
        );

        Ok(closed)
    }
}
