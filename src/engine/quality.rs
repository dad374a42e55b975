// ==========================================
// 吉他工坊生产执行系统 - 质检引擎
// ==========================================
// 职责: 质检记录的登记与问题关闭
// 说明: resolve 只改质检记录本身, 不驱动任何工序流转;
//       它的作用是让后续的流转调用能够通过闸口
// ==========================================

use crate::config::stage_graph::StageGraph;
use crate::domain::audit_log::{AuditAction, AuditLogEntry};
use crate::domain::quality::QualityCheck;
use crate::domain::types::{QualityOutcome, StageCode};
use crate::engine::access::{require_role, MANAGE_ROLES};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::batch_repo::BatchRepository;
use crate::repository::quality_repo::QualityCheckRepository;
use crate::repository::worker_repo::WorkerRepository;
use serde_json::json;
use std::sync::Arc;

// ==========================================
// QualityGateEngine - 质检引擎
// ==========================================
pub struct QualityGateEngine {
    worker_repo: Arc<WorkerRepository>,
    batch_repo: Arc<BatchRepository>,
    quality_repo: Arc<QualityCheckRepository>,
    audit_repo: Arc<AuditLogRepository>,
    graph: Arc<StageGraph>,
}

impl QualityGateEngine {
    pub fn new(
        worker_repo: Arc<WorkerRepository>,
        batch_repo: Arc<BatchRepository>,
        quality_repo: Arc<QualityCheckRepository>,
        audit_repo: Arc<AuditLogRepository>,
        graph: Arc<StageGraph>,
    ) -> Self {
        Self {
            worker_repo,
            batch_repo,
            quality_repo,
            audit_repo,
            graph,
        }
    }

    /// 登记质检记录
    ///
    /// # 规则
    /// - 检验人必须是在册员工 (任何角色都可以做检验)
    /// - 批次必须存在, 工序必须在流转图中
    pub fn record(
        &self,
        batch_id: &str,
        stage: &StageCode,
        outcome: QualityOutcome,
        notes: Option<String>,
        inspector_id: &str,
    ) -> WorkflowResult<QualityCheck> {
        let inspector = self
            .worker_repo
            .find_by_id(inspector_id)?
            .ok_or_else(|| WorkflowError::Unauthorized {
                actor_id: inspector_id.to_string(),
            })?;

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

        let mut check = QualityCheck::new(
            batch.batch_id.clone(),
            stage.clone(),
            outcome,
            inspector.worker_id.clone(),
        );
        if let Some(notes) = notes {
            check = check.with_notes(notes);
        }
        self.quality_repo.insert(&check)?;

        let audit = AuditLogEntry::new(
            Some(batch.batch_id.clone()),
            AuditAction::QualityRecord,
            inspector.worker_id.clone(),
        )
        .with_payload(&json!({
            "check_id": check.check_id,
            "stage": stage.as_str(),
            "outcome": outcome.as_str(),
        }));
        self.audit_repo.insert(&audit)?;

        tracing::info!(
            batch_id = %batch.batch_id,
            stage = %stage,
            outcome = %outcome,
            inspector = %inspector.worker_id,
            "质检记录已登记"
        );

        Ok(check)
    }

    /// 关闭质检问题 (结论改为 pass)
    ///
    /// # 规则
    /// - 操作人角色必须是 manager/admin
    /// - 仅未解决的记录可关闭; 已关闭的返回 NotFound
    /// - 不驱动流转: 后续流转仍需显式调用流转引擎
    pub fn resolve(
        &self,
        check_id: &str,
        resolution_notes: &str,
        resolver_id: &str,
    ) -> WorkflowResult<QualityCheck> {
        let resolver = self.worker_repo.find_by_id(resolver_id)?;
        let resolver = require_role(resolver_id, resolver.as_ref(), MANAGE_ROLES)?;

        let resolved = self
            .quality_repo
            .resolve(check_id, resolution_notes, &resolver.worker_id)?;

        let audit = AuditLogEntry::new(
            Some(resolved.batch_id.clone()),
            AuditAction::QualityResolve,
            resolver.worker_id.clone(),
        )
        .with_payload(&json!({
            "check_id": resolved.check_id,
            "stage": resolved.stage_code.as_str(),
        }))
        .with_detail(resolution_notes.to_string());
        self.audit_repo.insert(&audit)?;

        tracing::info!(
            check_id = %resolved.check_id,
            batch_id = %resolved.batch_id,
            resolver = %resolver.worker_id,
            "质检问题已关闭"
        );

        Ok(resolved)
    }
}
