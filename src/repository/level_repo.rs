// ==========================================
// 门店货架空间规划 - 层板数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: level_num 以两位字符串存储（"00" / "01" ...）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::layout::Level;
use crate::domain::types::LevelNum;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// LevelRepository - 层板仓储
// ==========================================
pub struct LevelRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LevelRepository {
    /// 创建新的层板仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, level_id: i64) -> RepositoryResult<Option<Level>> {
        let conn = self.get_conn()?;
        let level = conn
            .query_row(
                "SELECT id, section_id, level_num, level_height FROM levels WHERE id = ?1",
                params![level_id],
                Self::map_row,
            )
            .optional()?;
        Ok(level)
    }

    pub fn find_by_section_and_num(
        &self,
        section_id: i64,
        level_num: LevelNum,
    ) -> RepositoryResult<Option<Level>> {
        let conn = self.get_conn()?;
        let level = conn
            .query_row(
                r#"
                SELECT id, section_id, level_num, level_height
                FROM levels
                WHERE section_id = ?1 AND level_num = ?2
                "#,
                params![section_id, level_num.as_code()],
                Self::map_row,
            )
            .optional()?;
        Ok(level)
    }

    /// 查询货架格内全部层板（按层号升序）
    pub fn list_by_section(&self, section_id: i64) -> RepositoryResult<Vec<Level>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, section_id, level_num, level_height
            FROM levels
            WHERE section_id = ?1
            ORDER BY level_num
            "#,
        )?;
        let levels = stmt
            .query_map(params![section_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Level>>>()?;
        Ok(levels)
    }

    /// 查询货架段内全部层板
    pub fn list_by_aisle(&self, aisle_id: i64) -> RepositoryResult<Vec<Level>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT l.id, l.section_id, l.level_num, l.level_height
            FROM levels l
            JOIN sections s ON s.id = l.section_id
            WHERE s.aisle_id = ?1
            ORDER BY s.section_num, l.level_num
            "#,
        )?;
        let levels = stmt
            .query_map(params![aisle_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Level>>>()?;
        Ok(levels)
    }

    pub(crate) fn map_row(row: &rusqlite::Row) -> SqliteResult<Level> {
        let raw: String = row.get(2)?;
        let level_num = LevelNum::parse(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("非法层号: {}", raw).into(),
            )
        })?;
        Ok(Level {
            id: row.get(0)?,
            section_id: row.get(1)?,
            level_num,
            level_height: row.get(3)?,
        })
    }
}
