// ==========================================
// 吉他工坊生产执行系统 - 工序流转图
// ==========================================
// 职责: 从 production_stage / stage_transition 查找表加载流转图,
//       加载时一次性校验, 流转判定只查内存表
// 红线: 流转图是数据, 不是编译期逻辑; 禁止在业务代码里散落工序字符串比较
// ==========================================

use crate::domain::types::StageCode;
use rusqlite::Connection;
use std::collections::HashMap;
use thiserror::Error;

/// 流转图加载/校验错误
#[derive(Error, Debug)]
pub enum StageGraphError {
    #[error("工序表为空: production_stage 未配置任何工序")]
    EmptyStageTable,

    #[error("流转边引用了未知工序: {from} -> {to} (未知: {unknown})")]
    UnknownStageInEdge {
        from: String,
        to: String,
        unknown: String,
    },

    #[error("工序序号重复: seq={seq} (工序 {a} 与 {b})")]
    DuplicateSeq { seq: i64, a: String, b: String },

    #[error("数据库查询失败: {0}")]
    Db(#[from] rusqlite::Error),
}

/// 工序定义 (查找表一行)
#[derive(Debug, Clone)]
pub struct StageInfo {
    pub code: StageCode,
    pub seq: i64,          // 展示排序用; 不约束流转方向
    pub is_terminal: bool, // 进入即置批次完成标志
}

/// 流转边
#[derive(Debug, Clone)]
pub struct StageEdge {
    pub from: StageCode,
    pub to: StageCode,
    pub requires_quality_gate: bool,
}

// ==========================================
// StageGraph - 内存流转图
// ==========================================
/// 配置驱动的工序流转图
///
/// 加载后不可变; 每次流转请求通过 `edge()` 查询允许边。
/// 返工边 (如 acoustic_qc -> sanding) 与正向边同等地位, 只要配置了就允许。
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: HashMap<StageCode, StageInfo>,
    edges: HashMap<(StageCode, StageCode), StageEdge>,
    entry: StageCode,
}

impl StageGraph {
    /// 从查找表加载并校验流转图
    ///
    /// # 校验规则
    /// - 工序表非空
    /// - 每条边的两端都是已知工序
    /// - seq 不重复 (保证入口工序唯一可定)
    pub fn load(conn: &Connection) -> Result<Self, StageGraphError> {
        let mut stmt =
            conn.prepare("SELECT stage_code, seq, is_terminal FROM production_stage ORDER BY seq")?;
        let stage_rows = stmt
            .query_map([], |row| {
                Ok(StageInfo {
                    code: StageCode::new(row.get::<_, String>(0)?),
                    seq: row.get(1)?,
                    is_terminal: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<StageInfo>, _>>()?;

        if stage_rows.is_empty() {
            return Err(StageGraphError::EmptyStageTable);
        }

        let mut by_seq: HashMap<i64, &StageInfo> = HashMap::new();
        for info in &stage_rows {
            if let Some(existing) = by_seq.insert(info.seq, info) {
                return Err(StageGraphError::DuplicateSeq {
                    seq: info.seq,
                    a: existing.code.to_string(),
                    b: info.code.to_string(),
                });
            }
        }

        // 入口工序 = seq 最小者 (上面已保证 seq 唯一)
        let entry = stage_rows
            .iter()
            .min_by_key(|s| s.seq)
            .map(|s| s.code.clone())
            .expect("stage_rows non-empty");

        let stages: HashMap<StageCode, StageInfo> = stage_rows
            .into_iter()
            .map(|info| (info.code.clone(), info))
            .collect();

        let mut stmt = conn
            .prepare("SELECT from_stage, to_stage, requires_quality_gate FROM stage_transition")?;
        let edge_rows = stmt
            .query_map([], |row| {
                Ok(StageEdge {
                    from: StageCode::new(row.get::<_, String>(0)?),
                    to: StageCode::new(row.get::<_, String>(1)?),
                    requires_quality_gate: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<StageEdge>, _>>()?;

        let mut edges = HashMap::new();
        for edge in edge_rows {
            for end in [&edge.from, &edge.to] {
                if !stages.contains_key(end) {
                    return Err(StageGraphError::UnknownStageInEdge {
                        from: edge.from.to_string(),
                        to: edge.to.to_string(),
                        unknown: end.to_string(),
                    });
                }
            }
            edges.insert((edge.from.clone(), edge.to.clone()), edge);
        }

        Ok(Self {
            stages,
            edges,
            entry,
        })
    }

    /// 工序是否存在
    pub fn contains(&self, stage: &StageCode) -> bool {
        self.stages.contains_key(stage)
    }

    /// 查询允许边; 不在图中返回 None
    pub fn edge(&self, from: &StageCode, to: &StageCode) -> Option<&StageEdge> {
        self.edges.get(&(from.clone(), to.clone()))
    }

    /// 工序是否为终点
    pub fn is_terminal(&self, stage: &StageCode) -> bool {
        self.stages
            .get(stage)
            .map(|s| s.is_terminal)
            .unwrap_or(false)
    }

    /// 新批次落点 (seq 最小的工序)
    pub fn entry_stage(&self) -> &StageCode {
        &self.entry
    }

    /// 某工序的全部允许去向 (按目标 seq 排序, 展示用)
    pub fn destinations(&self, from: &StageCode) -> Vec<&StageEdge> {
        let mut out: Vec<&StageEdge> = self
            .edges
            .values()
            .filter(|e| &e.from == from)
            .collect();
        out.sort_by_key(|e| self.stages.get(&e.to).map(|s| s.seq).unwrap_or(i64::MAX));
        out
    }

    /// 工序总数
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

// ==========================================
// 默认流转图种子数据
// ==========================================
/// 写入默认吉他工序集与流转边 (幂等)
///
/// intake -> sanding -> finishing -> sub_assembly -> final_assembly
///        -> acoustic_qc -> packaging -> shipped
/// 返工边: acoustic_qc -> sanding
/// 质检闸口: acoustic_qc -> packaging
pub fn seed_default_graph(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        INSERT OR IGNORE INTO production_stage (stage_code, seq, is_terminal) VALUES
            ('intake', 10, 0),
            ('sanding', 20, 0),
            ('finishing', 30, 0),
            ('sub_assembly', 40, 0),
            ('final_assembly', 50, 0),
            ('acoustic_qc', 60, 0),
            ('packaging', 70, 0),
            ('shipped', 80, 1);

        INSERT OR IGNORE INTO stage_transition (from_stage, to_stage, requires_quality_gate) VALUES
            ('intake', 'sanding', 0),
            ('sanding', 'finishing', 0),
            ('finishing', 'sub_assembly', 0),
            ('sub_assembly', 'final_assembly', 0),
            ('final_assembly', 'acoustic_qc', 0),
            ('acoustic_qc', 'packaging', 1),
            ('acoustic_qc', 'sanding', 0),
            ('packaging', 'shipped', 0);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn graph_on_seeded_db() -> StageGraph {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        seed_default_graph(&conn).unwrap();
        StageGraph::load(&conn).unwrap()
    }

    #[test]
    fn test_load_default_graph() {
        let graph = graph_on_seeded_db();
        assert_eq!(graph.stage_count(), 8);
        assert_eq!(graph.entry_stage().as_str(), "intake");
        assert!(graph.is_terminal(&StageCode::from("shipped")));
        assert!(!graph.is_terminal(&StageCode::from("packaging")));
    }

    #[test]
    fn test_edge_lookup() {
        let graph = graph_on_seeded_db();
        let from = StageCode::from("sanding");
        let to = StageCode::from("finishing");
        let edge = graph.edge(&from, &to).unwrap();
        assert!(!edge.requires_quality_gate);

        // 闸口边
        let gated = graph
            .edge(&StageCode::from("acoustic_qc"), &StageCode::from("packaging"))
            .unwrap();
        assert!(gated.requires_quality_gate);

        // 返工边
        assert!(graph
            .edge(&StageCode::from("acoustic_qc"), &StageCode::from("sanding"))
            .is_some());

        // 跳工序不允许
        assert!(graph
            .edge(&StageCode::from("intake"), &StageCode::from("packaging"))
            .is_none());
    }

    #[test]
    fn test_unknown_stage_in_edge_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO production_stage (stage_code, seq, is_terminal)
            VALUES ('intake', 10, 0);
            "#,
        )
        .unwrap();
        // 绕过外键直接制造脏数据 (模拟人工改库)
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        conn.execute_batch(
            "INSERT INTO stage_transition (from_stage, to_stage, requires_quality_gate)
             VALUES ('intake', 'ghost_stage', 0);",
        )
        .unwrap();

        let err = StageGraph::load(&conn).unwrap_err();
        match err {
            StageGraphError::UnknownStageInEdge { unknown, .. } => {
                assert_eq!(unknown, "ghost_stage");
            }
            other => panic!("expected UnknownStageInEdge, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_stage_table_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let err = StageGraph::load(&conn).unwrap_err();
        assert!(matches!(err, StageGraphError::EmptyStageTable));
    }

    #[test]
    fn test_destinations_sorted_by_seq() {
        let graph = graph_on_seeded_db();
        let dests = graph.destinations(&StageCode::from("acoustic_qc"));
        let codes: Vec<&str> = dests.iter().map(|e| e.to.as_str()).collect();
        // sanding(seq=20) 在 packaging(seq=70) 之前
        assert_eq!(codes, vec!["sanding", "packaging"]);
    }
}
