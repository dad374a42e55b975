// ==========================================
// 吉他工坊生产执行系统 - 应用层
// ==========================================
// 职责: 组合根与应用级共享状态
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
