// ==========================================
// 吉他工坊生产执行系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产批次流转与质检闸口核心 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置与流转图
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组合根
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchPriority, QualityOutcome, Role, StageCode};

// 领域实体
pub use domain::{AuditAction, AuditLogEntry, Batch, Order, QualityCheck, StageAssignment, Worker};

// 配置
pub use config::{ConfigManager, StageGraph};

// 引擎
pub use engine::{
    AssignmentEngine, QualityGateEngine, StageTransitionEngine, TransitionRequest, WorkflowError,
};

// API
pub use api::{AssignmentApi, AuditApi, BatchApi, OrderApi, QualityApi};

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
