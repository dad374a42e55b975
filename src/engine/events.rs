// ==========================================
// 吉他工坊生产执行系统 - 引擎层通知发布
// ==========================================
// 职责: 定义员工通知 trait, 实现依赖倒置
// 说明: Engine 层定义 trait; 落库实现与测试替身分别适配
// 红线: 通知是尽力而为旁路, 失败只记日志, 不影响主流程
// ==========================================

use crate::repository::notification_repo::{Notification, NotificationRepository};
use std::error::Error;
use std::sync::Arc;

/// 员工通知 trait
///
/// 返回通知ID; 失败由调用方决定降级策略 (通常 warn 后继续)
pub trait NotificationSink: Send + Sync {
    fn notify(
        &self,
        worker_id: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// DbNotificationSink - 落库实现
// ==========================================
pub struct DbNotificationSink {
    repo: Arc<NotificationRepository>,
}

impl DbNotificationSink {
    pub fn new(repo: Arc<NotificationRepository>) -> Self {
        Self { repo }
    }
}

impl NotificationSink for DbNotificationSink {
    fn notify(
        &self,
        worker_id: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let notification = Notification::new(
            worker_id.to_string(),
            title.to_string(),
            body.map(|s| s.to_string()),
        );
        let id = self
            .repo
            .insert(&notification)
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        Ok(id)
    }
}

// ==========================================
// NoopNotificationSink - 空实现 (通知关闭/测试用)
// ==========================================
pub struct NoopNotificationSink;

impl NotificationSink for NoopNotificationSink {
    fn notify(
        &self,
        _worker_id: &str,
        _title: &str,
        _body: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(String::new())
    }
}
