// ==========================================
// 吉他工坊生产执行系统 - 工序流转引擎
// ==========================================
// 职责: 批次工序流转的校验与原子提交 (系统唯一流转入口)
// 红线: 校验顺序固定: 身份 -> 权限 -> 批次 -> 流转边 -> 质检闸口 -> CAS提交
// 红线: 不缓存批次状态; 每次调用都重新读当前工序
// ==========================================

use crate::config::stage_graph::StageGraph;
use crate::domain::audit_log::AuditLogEntry;
use crate::domain::batch::Batch;
use crate::domain::types::StageCode;
use crate::engine::access::{require_role, MANAGE_ROLES};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::repository::batch_repo::BatchRepository;
use crate::repository::quality_repo::QualityCheckRepository;
use crate::repository::worker_repo::WorkerRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 工序流转请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub batch_id: String,
    pub target_stage: StageCode,
    pub acting_worker_id: String,
    /// 闸口边必须携带; 非闸口边忽略
    pub quality_check_id: Option<String>,
}

// ==========================================
// StageTransitionEngine - 工序流转引擎
// ==========================================
pub struct StageTransitionEngine {
    worker_repo: Arc<WorkerRepository>,
    batch_repo: Arc<BatchRepository>,
    quality_repo: Arc<QualityCheckRepository>,
    graph: Arc<StageGraph>,
}

impl StageTransitionEngine {
    pub fn new(
        worker_repo: Arc<WorkerRepository>,
        batch_repo: Arc<BatchRepository>,
        quality_repo: Arc<QualityCheckRepository>,
        graph: Arc<StageGraph>,
    ) -> Self {
        Self {
            worker_repo,
            batch_repo,
            quality_repo,
            graph,
        }
    }

    /// 执行一次工序流转
    ///
    /// # 校验顺序 (固定)
    /// 1. 解析操作人: 查无此人 -> Unauthorized; 角色不是 manager/admin -> Forbidden
    /// 2. 解析批次: 不存在 -> NotFound
    /// 3. (current -> target) 必须是配置的流转边 -> InvalidTransition
    /// 4. 闸口边: 质检记录必须存在、同批次、同当前工序、结论 pass
    ///    -> QualityGateNotSatisfied
    /// 5. CAS提交: 批次更新 + 审计插入同事务; CAS失败 -> Conflict
    ///
    /// # 返回
    /// 提交后重新读出的批次
    pub fn transition(&self, req: &TransitionRequest) -> WorkflowResult<Batch> {
        // 1. 身份与权限
        let actor = self.worker_repo.find_by_id(&req.acting_worker_id)?;
        let actor = require_role(&req.acting_worker_id, actor.as_ref(), MANAGE_ROLES)?;

        // 2. 批次 (每次都重读, 不允许用上次调用的缓存状态)
        let batch = self
            .batch_repo
            .find_by_id(&req.batch_id)?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Batch".to_string(),
                id: req.batch_id.clone(),
            })?;
        let current = batch.current_stage.clone();

        // 3. 流转边
        let edge = self
            .graph
            .edge(&current, &req.target_stage)
            .ok_or_else(|| WorkflowError::InvalidTransition {
                from: current.to_string(),
                to: req.target_stage.to_string(),
            })?;

        // 4. 质检闸口
        let gate_check_id = if edge.requires_quality_gate {
            Some(self.verify_quality_gate(&batch, &current, req.quality_check_id.as_deref())?)
        } else {
            None
        };

        // 5. 原子提交 (CAS + 审计)
        let mark_completed = self.graph.is_terminal(&req.target_stage);
        let audit = AuditLogEntry::stage_transition(
            batch.batch_id.clone(),
            actor.worker_id.clone(),
            current.as_str(),
            req.target_stage.as_str(),
            gate_check_id,
        )
        .with_payload(req);

        self.batch_repo
            .commit_transition(
                &batch.batch_id,
                &current,
                &req.target_stage,
                mark_completed,
                &audit,
            )
            .map_err(|e| {
                if let crate::repository::RepositoryError::StageConflict { .. } = &e {
                    tracing::warn!(
                        batch_id = %batch.batch_id,
                        actor = %actor.worker_id,
                        target = %req.target_stage,
                        "工序流转提交时发生并发冲突"
                    );
                } else {
                    tracing::error!(
                        batch_id = %batch.batch_id,
                        actor = %actor.worker_id,
                        target = %req.target_stage,
                        error = %e,
                        "工序流转提交失败"
                    );
                }
                WorkflowError::from(e)
            })?;

        tracing::info!(
            batch_id = %batch.batch_id,
            actor = %actor.worker_id,
            from = %current,
            to = %req.target_stage,
            completed = mark_completed,
            "工序流转已提交"
        );

        // 提交后重读, 返回最新批次
        self.batch_repo
            .find_by_id(&batch.batch_id)?
            .ok_or_else(|| WorkflowError::Internal(format!("批次 {} 提交后消失", batch.batch_id)))
    }

    /// 校验质检闸口, 通过时返回采信的质检记录ID
    fn verify_quality_gate(
        &self,
        batch: &Batch,
        current: &StageCode,
        quality_check_id: Option<&str>,
    ) -> WorkflowResult<String> {
        let check_id = quality_check_id.ok_or_else(|| {
            WorkflowError::QualityGateNotSatisfied(format!(
                "流转 {} -> 下一工序需要质检记录, 但请求未携带",
                current
            ))
        })?;

        let check = self
            .quality_repo
            .find_by_id(check_id)?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "QualityCheck".to_string(),
                id: check_id.to_string(),
            })?;

        if check.batch_id != batch.batch_id {
            return Err(WorkflowError::QualityGateNotSatisfied(format!(
                "质检记录 {} 属于批次 {}, 不是批次 {}",
                check.check_id, check.batch_id, batch.batch_id
            )));
        }
        if &check.stage_code != current {
            return Err(WorkflowError::QualityGateNotSatisfied(format!(
                "质检记录 {} 针对工序 {}, 当前工序是 {}",
                check.check_id, check.stage_code, current
            )));
        }
        if !check.outcome.satisfies_gate() {
            return Err(WorkflowError::QualityGateNotSatisfied(format!(
                "质检记录 {} 结论为 {}, 闸口要求 pass",
                check.check_id, check.outcome
            )));
        }

        Ok(check.check_id)
    }
}
