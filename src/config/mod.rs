// ==========================================
// 吉他工坊生产执行系统 - 配置层
// ==========================================
// 职责: 系统配置与工序流转图加载
// ==========================================

pub mod config_manager;
pub mod stage_graph;

pub use config_manager::ConfigManager;
pub use stage_graph::{seed_default_graph, StageEdge, StageGraph, StageGraphError, StageInfo};
