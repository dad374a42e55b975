// ==========================================
// 吉他工坊生产执行系统 - 订单 API
// ==========================================
// 职责: 订单接单 (CSV 导入) 与查询
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::audit_log::{AuditAction, AuditLogEntry};
use crate::domain::order::Order;
use crate::engine::access::{require_role, MANAGE_ROLES};
use crate::importer::order_importer::{ImportReport, OrderImporter};
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::worker_repo::WorkerRepository;

/// 订单信息 (对外表示)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: String,
    pub order_no: String,
    pub model: String,
    pub customer_name: String,
    pub due_date: Option<String>,
    pub created_at: String,
}

impl From<Order> for OrderInfo {
    fn from(o: Order) -> Self {
        Self {
            order_id: o.order_id,
            order_no: o.order_no,
            model: o.model,
            customer_name: o.customer_name,
            due_date: o.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            created_at: o.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    worker_repo: Arc<WorkerRepository>,
    order_repo: Arc<OrderRepository>,
    audit_repo: Arc<AuditLogRepository>,
    importer: Arc<OrderImporter>,
}

impl OrderApi {
    pub fn new(
        worker_repo: Arc<WorkerRepository>,
        order_repo: Arc<OrderRepository>,
        audit_repo: Arc<AuditLogRepository>,
        importer: Arc<OrderImporter>,
    ) -> Self {
        Self {
            worker_repo,
            order_repo,
            audit_repo,
            importer,
        }
    }

    /// CSV 订单导入
    ///
    /// # 规则
    /// - 操作人角色必须是 manager/admin
    /// - 行级错误进入报告; 文件级错误直接返回
    /// - 导入动作落审计 (含成功/跳过计数)
    pub fn import_orders(&self, csv_path: &Path, acting_worker_id: &str) -> ApiResult<ImportReport> {
        let actor = self.worker_repo.find_by_id(acting_worker_id)?;
        let actor = require_role(acting_worker_id, actor.as_ref(), MANAGE_ROLES)
            .map_err(ApiError::from)?
            .clone();

        let report = self.importer.import_file(csv_path)?;

        let audit = AuditLogEntry::new(None, AuditAction::OrderImport, actor.worker_id.clone())
            .with_payload(&json!({
                "file": csv_path.display().to_string(),
                "imported": report.imported,
                "skipped": report.skipped,
            }));
        self.audit_repo.insert(&audit)?;

        Ok(report)
    }

    /// 全部订单
    pub fn list_orders(&self) -> ApiResult<Vec<OrderInfo>> {
        let orders = self.order_repo.list()?;
        Ok(orders.into_iter().map(OrderInfo::from).collect())
    }

    /// 按业务单号查询
    pub fn get_order_by_no(&self, order_no: &str) -> ApiResult<OrderInfo> {
        if order_no.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }

        let order = self
            .order_repo
            .find_by_order_no(order_no)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(no={})不存在", order_no)))?;

        Ok(OrderInfo::from(order))
    }
}
