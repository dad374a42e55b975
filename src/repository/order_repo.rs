// ==========================================
// 吉他工坊生产执行系统 - 订单仓储
// ==========================================

use crate::domain::order::Order;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::worker_repo::parse_ts;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Order> {
        let due_date: Option<String> = row.get(4)?;
        let created_at: String = row.get(5)?;
        Ok(Order {
            order_id: row.get(0)?,
            order_no: row.get(1)?,
            model: row.get(2)?,
            customer_name: row.get(3)?,
            due_date: due_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            created_at: parse_ts(&created_at),
        })
    }

    /// 插入订单
    pub fn insert(&self, order: &Order) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_on(&conn, order)?;
        Ok(order.order_id.clone())
    }

    /// 批量插入订单 (单事务: 任一行失败全部回滚)
    pub fn batch_insert(&self, orders: &[Order]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for order in orders {
            Self::insert_on(&tx, order)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    fn insert_on(conn: &Connection, order: &Order) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO orders (order_id, order_no, model, customer_name, due_date, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                order.order_id,
                order.order_no,
                order.model,
                order.customer_name,
                order.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询订单
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT order_id, order_no, model, customer_name, due_date, created_at
               FROM orders WHERE order_id = ?"#,
            params![order_id],
            |row| Self::map_row(row),
        ) {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按业务单号查询
    pub fn find_by_order_no(&self, order_no: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT order_id, order_no, model, customer_name, due_date, created_at
               FROM orders WHERE order_no = ?"#,
            params![order_no],
            |row| Self::map_row(row),
        ) {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部订单 (按创建时间倒序)
    pub fn list(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT order_id, order_no, model, customer_name, due_date, created_at
               FROM orders ORDER BY created_at DESC, order_no DESC"#,
        )?;

        let orders = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<Order>, _>>()?;

        Ok(orders)
    }
}
