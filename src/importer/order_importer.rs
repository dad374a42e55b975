// ==========================================
// 吉他工坊生产执行系统 - 订单导入器
// ==========================================
// 职责: CSV 订单接单 (逐行校验 + 单事务写入)
// 格式: order_no, model, customer_name, due_date(可空, YYYY-MM-DD)
// 规则: 校验失败的行记入报告并跳过; 合法行整体一个事务落库
// ==========================================

use crate::domain::order::Order;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::order_repo::OrderRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// 行级错误 (报告用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize, // 1-based 数据行号 (不含表头)
    pub message: String,
}

/// 导入报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// CSV 原始行 (serde 反序列化目标)
#[derive(Debug, Deserialize)]
struct OrderCsvRow {
    order_no: String,
    model: String,
    customer_name: String,
    #[serde(default)]
    due_date: Option<String>,
}

// ==========================================
// OrderImporter - 订单导入器
// ==========================================
pub struct OrderImporter {
    order_repo: Arc<OrderRepository>,
}

impl OrderImporter {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 从 CSV 文件导入订单
    ///
    /// # 返回
    /// ImportReport: 成功/跳过行数与逐行错误
    ///
    /// # 失败
    /// 文件级问题 (无法读取/表头缺列) 返回 Err; 行级问题进入报告
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportReport> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        // 表头校验: 缺列时 serde 反序列化每行都会失败, 提前给出明确错误
        let headers = reader.headers()?.clone();
        for required in ["order_no", "model", "customer_name"] {
            if !headers.iter().any(|h| h == required) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }

        let mut orders: Vec<Order> = Vec::new();
        let mut errors: Vec<RowError> = Vec::new();
        let mut seen_order_nos: HashSet<String> = HashSet::new();

        for (idx, result) in reader.deserialize::<OrderCsvRow>().enumerate() {
            let row_no = idx + 1;
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    errors.push(RowError {
                        row: row_no,
                        message: format!("行解析失败: {}", e),
                    });
                    continue;
                }
            };

            match self.validate_row(row_no, raw, &mut seen_order_nos) {
                Ok(order) => orders.push(order),
                Err(e) => errors.push(RowError {
                    row: row_no,
                    message: e.to_string(),
                }),
            }
        }

        // 合法行单事务写入; 任一行撞库内唯一约束则整批回滚
        let imported = if orders.is_empty() {
            0
        } else {
            self.order_repo
                .batch_insert(&orders)
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?
        };

        let report = ImportReport {
            imported,
            skipped: errors.len(),
            errors,
        };

        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            "订单导入完成"
        );

        Ok(report)
    }

    /// 单行校验: 必填字段、日期格式、文件内单号去重、库内单号去重
    fn validate_row(
        &self,
        row_no: usize,
        raw: OrderCsvRow,
        seen: &mut HashSet<String>,
    ) -> ImportResult<Order> {
        for (field, value) in [
            ("order_no", &raw.order_no),
            ("model", &raw.model),
            ("customer_name", &raw.customer_name),
        ] {
            if value.trim().is_empty() {
                return Err(ImportError::FieldValueError {
                    row: row_no,
                    field: field.to_string(),
                    message: "不能为空".to_string(),
                });
            }
        }

        if !seen.insert(raw.order_no.clone()) {
            return Err(ImportError::DuplicateOrderNo {
                row: row_no,
                order_no: raw.order_no,
            });
        }
        if self.order_repo.find_by_order_no(&raw.order_no)?.is_some() {
            return Err(ImportError::DuplicateOrderNo {
                row: row_no,
                order_no: raw.order_no,
            });
        }

        let mut order = Order::new(raw.order_no, raw.model, raw.customer_name);
        if let Some(due) = raw.due_date.as_deref().filter(|s| !s.is_empty()) {
            let date = NaiveDate::parse_from_str(due, "%Y-%m-%d").map_err(|_| {
                ImportError::DateFormatError {
                    row: row_no,
                    value: due.to_string(),
                }
            })?;
            order = order.with_due_date(date);
        }

        Ok(order)
    }
}
