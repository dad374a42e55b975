// ==========================================
// 吉他工坊生产执行系统 - 批次 API
// ==========================================
// 职责: 批次创建、查询、工序流转入口
// 说明: 流转判定全部委托 StageTransitionEngine, 本层只做输入校验与DTO转换
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::stage_graph::StageGraph;
use crate::domain::audit_log::{AuditAction, AuditLogEntry};
use crate::domain::batch::Batch;
use crate::domain::types::{BatchPriority, StageCode};
use crate::engine::access::{require_role, MANAGE_ROLES};
use crate::engine::transition::{StageTransitionEngine, TransitionRequest};
use crate::repository::batch_repo::BatchRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::worker_repo::WorkerRepository;

// ==========================================
// DTO
// ==========================================

/// 批次信息 (对外表示)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_id: String,
    pub batch_no: String,
    pub current_stage: String,
    pub priority: String,
    pub completed: bool,
    pub order_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Batch> for BatchInfo {
    fn from(batch: Batch) -> Self {
        Self {
            batch_id: batch.batch_id,
            batch_no: batch.batch_no,
            current_stage: batch.current_stage.to_string(),
            priority: batch.priority.to_string(),
            completed: batch.completed,
            order_ids: batch.order_ids,
            created_at: batch.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: batch.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// 某工序的允许去向 (前端下拉用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationInfo {
    pub to_stage: String,
    pub requires_quality_gate: bool,
}

// ==========================================
// BatchApi - 批次 API
// ==========================================
pub struct BatchApi {
    worker_repo: Arc<WorkerRepository>,
    order_repo: Arc<OrderRepository>,
    batch_repo: Arc<BatchRepository>,
    transition_engine: Arc<StageTransitionEngine>,
    graph: Arc<StageGraph>,
}

impl BatchApi {
    pub fn new(
        worker_repo: Arc<WorkerRepository>,
        order_repo: Arc<OrderRepository>,
        batch_repo: Arc<BatchRepository>,
        transition_engine: Arc<StageTransitionEngine>,
        graph: Arc<StageGraph>,
    ) -> Self {
        Self {
            worker_repo,
            order_repo,
            batch_repo,
            transition_engine,
            graph,
        }
    }

    /// 创建批次 (落在流转图入口工序)
    ///
    /// # 规则
    /// - 操作人角色必须是 manager/admin
    /// - 批次号非空; 成员订单至少一个且全部存在
    pub fn create_batch(
        &self,
        batch_no: &str,
        order_ids: Vec<String>,
        priority: BatchPriority,
        acting_worker_id: &str,
    ) -> ApiResult<BatchInfo> {
        if batch_no.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次号不能为空".to_string()));
        }
        if order_ids.is_empty() {
            return Err(ApiError::InvalidInput("批次至少包含一个订单".to_string()));
        }

        let actor = self.worker_repo.find_by_id(acting_worker_id)?;
        let actor = require_role(acting_worker_id, actor.as_ref(), MANAGE_ROLES)
            .map_err(ApiError::from)?
            .clone();

        for order_id in &order_ids {
            if self.order_repo.find_by_id(order_id)?.is_none() {
                return Err(ApiError::NotFound(format!("Order(id={})不存在", order_id)));
            }
        }

        let batch = Batch::new(
            batch_no.trim().to_string(),
            self.graph.entry_stage().clone(),
            priority,
        )
        .with_orders(order_ids.clone());

        let audit = AuditLogEntry::new(
            Some(batch.batch_id.clone()),
            AuditAction::BatchCreate,
            actor.worker_id.clone(),
        )
        .with_payload(&json!({
            "batch_no": batch.batch_no,
            "priority": priority.as_str(),
            "order_count": order_ids.len(),
        }));

        self.batch_repo.create_with_orders(&batch, &audit)?;

        tracing::info!(
            batch_id = %batch.batch_id,
            batch_no = %batch.batch_no,
            actor = %actor.worker_id,
            "批次已创建"
        );

        Ok(BatchInfo::from(batch))
    }

    /// 工序流转
    pub fn transition(&self, req: &TransitionRequest) -> ApiResult<BatchInfo> {
        if req.batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }
        if req.target_stage.as_str().trim().is_empty() {
            return Err(ApiError::InvalidInput("目标工序不能为空".to_string()));
        }

        let batch = self.transition_engine.transition(req)?;
        Ok(BatchInfo::from(batch))
    }

    /// 批次详情
    pub fn get_batch(&self, batch_id: &str) -> ApiResult<BatchInfo> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", batch_id)))?;

        Ok(BatchInfo::from(batch))
    }

    /// 全部未完成批次 (优先级高者在前)
    pub fn list_open_batches(&self) -> ApiResult<Vec<BatchInfo>> {
        let batches = self.batch_repo.list_open()?;
        Ok(batches.into_iter().map(BatchInfo::from).collect())
    }

    /// 批次当前工序的允许去向
    pub fn allowed_destinations(&self, batch_id: &str) -> ApiResult<Vec<DestinationInfo>> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", batch_id)))?;

        Ok(self
            .graph
            .destinations(&batch.current_stage)
            .into_iter()
            .map(|edge| DestinationInfo {
                to_stage: edge.to.to_string(),
                requires_quality_gate: edge.requires_quality_gate,
            })
            .collect())
    }

    /// 构造流转请求 (便捷方法, 供调用方/测试使用)
    pub fn transition_request(
        batch_id: &str,
        target_stage: &str,
        acting_worker_id: &str,
        quality_check_id: Option<&str>,
    ) -> TransitionRequest {
        TransitionRequest {
            batch_id: batch_id.to_string(),
            target_stage: StageCode::from(target_stage),
            acting_worker_id: acting_worker_id.to_string(),
            quality_check_id: quality_check_id.map(|s| s.to_string()),
        }
    }
}
