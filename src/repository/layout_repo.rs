// ==========================================
// 门店货架空间规划 - 物理布局数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: stores / pairs / aisles / sections 表
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::layout::{
    Aisle, AisleDimensions, AisleDraft, NewPair, Pair, Section, SectionDraft, Store,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// LayoutRepository - 布局仓储
// ==========================================
pub struct LayoutRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LayoutRepository {
    /// 创建新的布局仓储实例
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

    // ==========================================
    // 门店
    // ==========================================

    pub fn create_store(&self, store_num: i64, store_loc: Option<&str>) -> RepositoryResult<Store> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO stores (store_num, store_loc) VALUES (?1, ?2)",
            params![store_num, store_loc],
        )?;
        Ok(Store {
            id: conn.last_insert_rowid(),
            store_num,
            store_loc: store_loc.map(str::to_string),
        })
    }

    pub fn find_store(&self, store_id: i64) -> RepositoryResult<Option<Store>> {
        let conn = self.get_conn()?;
        let store = conn
            .query_row(
                "SELECT id, store_num, store_loc FROM stores WHERE id = ?1",
                params![store_id],
                |row| {
                    Ok(Store {
                        id: row.get(0)?,
                        store_num: row.get(1)?,
                        store_loc: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(store)
    }

    // ==========================================
    // 货架对 + 货架段 + 货架格
    // ==========================================

    /// 在单个事务内创建货架对及其全部货架段、货架格
    ///
    /// # 参数
    /// - pair: 货架对参数
    /// - aisles: 已展开的货架段草稿
    pub fn insert_pair_layout(&self, pair: &NewPair, aisles: &[AisleDraft]) -> RepositoryResult<Pair> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO pairs (
                store_id, pair_nums, pair_depth, pair_height, pair_section_width, pair_sections
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                pair.store_id,
                pair.pair_nums,
                pair.pair_depth,
                pair.pair_height,
                pair.pair_section_width,
                pair.pair_sections,
            ],
        )?;
        let pair_id = tx.last_insert_rowid();

        for aisle in aisles {
            tx.execute(
                r#"
                INSERT INTO aisles (
                    pair_id, aisle_num, aisle_depth, aisle_height, aisle_section_width, aisle_sections
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    pair_id,
                    aisle.aisle_num,
                    aisle.dimensions.aisle_depth,
                    aisle.dimensions.aisle_height,
                    aisle.dimensions.aisle_section_width,
                    aisle.aisle_sections,
                ],
            )?;
            let aisle_id = tx.last_insert_rowid();
            Self::insert_sections_with(&tx, aisle_id, &aisle.sections)?;
        }

        tx.commit()?;

        Ok(Pair {
            id: pair_id,
            store_id: pair.store_id,
            pair_nums: pair.pair_nums.clone(),
            pair_depth: pair.pair_depth,
            pair_height: pair.pair_height,
            pair_section_width: pair.pair_section_width,
            pair_sections: pair.pair_sections,
        })
    }

    /// 查询货架段（带所属门店ID）
    pub fn find_aisle(&self, aisle_id: i64) -> RepositoryResult<Option<Aisle>> {
        let conn = self.get_conn()?;
        let aisle = conn
            .query_row(
                r#"
                SELECT a.id, a.pair_id, p.store_id, a.aisle_num, a.aisle_depth,
                       a.aisle_height, a.aisle_section_width, a.aisle_sections
                FROM aisles a
                JOIN pairs p ON p.id = a.pair_id
                WHERE a.id = ?1
                "#,
                params![aisle_id],
                Self::map_aisle,
            )
            .optional()?;
        Ok(aisle)
    }

    pub fn list_aisles_by_pair(&self, pair_id: i64) -> RepositoryResult<Vec<Aisle>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.pair_id, p.store_id, a.aisle_num, a.aisle_depth,
                   a.aisle_height, a.aisle_section_width, a.aisle_sections
            FROM aisles a
            JOIN pairs p ON p.id = a.pair_id
            WHERE a.pair_id = ?1
            ORDER BY a.id
            "#,
        )?;
        let aisles = stmt
            .query_map(params![pair_id], Self::map_aisle)?
            .collect::<SqliteResult<Vec<Aisle>>>()?;
        Ok(aisles)
    }

    /// 查询货架段内的货架格（按 section_num 升序）
    pub fn list_sections(&self, aisle_id: i64) -> RepositoryResult<Vec<Section>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, aisle_id, section_num, section_width, section_depth, section_height
            FROM sections
            WHERE aisle_id = ?1
            ORDER BY section_num, id
            "#,
        )?;
        let sections = stmt
            .query_map(params![aisle_id], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    aisle_id: row.get(1)?,
                    section_num: row.get(2)?,
                    section_width: row.get(3)?,
                    section_depth: row.get(4)?,
                    section_height: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<Section>>>()?;
        Ok(sections)
    }

    /// 当前最大 section_num（无货架格时为 0）
    pub fn max_section_num(&self, aisle_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(section_num) FROM sections WHERE aisle_id = ?1",
            params![aisle_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    /// 追加货架格，并刷新货架段的 aisle_sections
    pub fn insert_sections(&self, aisle_id: i64, sections: &[SectionDraft]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let count = Self::insert_sections_with(&tx, aisle_id, sections)?;
        tx.execute(
            r#"
            UPDATE aisles
            SET aisle_sections = (SELECT COUNT(*) FROM sections WHERE aisle_id = ?1)
            WHERE id = ?1
            "#,
            params![aisle_id],
        )?;
        tx.commit()?;
        Ok(count)
    }

    /// 更新货架段尺寸并同步到全部货架格
    pub fn update_aisle_dimensions(
        &self,
        aisle_id: i64,
        dims: &AisleDimensions,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let affected = tx.execute(
            r#"
            UPDATE aisles
            SET aisle_depth = ?2, aisle_height = ?3, aisle_section_width = ?4
            WHERE id = ?1
            "#,
            params![aisle_id, dims.aisle_depth, dims.aisle_height, dims.aisle_section_width],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Aisle".to_string(),
                id: aisle_id.to_string(),
            });
        }
        let synced = tx.execute(
            r#"
            UPDATE sections
            SET section_depth = ?2, section_height = ?3, section_width = ?4,
                updated_at = datetime('now')
            WHERE aisle_id = ?1
            "#,
            params![aisle_id, dims.aisle_depth, dims.aisle_height, dims.aisle_section_width],
        )?;
        tx.commit()?;
        Ok(synced)
    }

    fn insert_sections_with(
        conn: &Connection,
        aisle_id: i64,
        sections: &[SectionDraft],
    ) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO sections (
                aisle_id, section_num, section_width, section_depth, section_height
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for section in sections {
            stmt.execute(params![
                aisle_id,
                section.section_num,
                section.section_width,
                section.section_depth,
                section.section_height,
            ])?;
        }
        Ok(sections.len())
    }

    fn map_aisle(row: &rusqlite::Row) -> SqliteResult<Aisle> {
        Ok(Aisle {
            id: row.get(0)?,
            pair_id: row.get(1)?,
            store_id: row.get(2)?,
            aisle_num: row.get(3)?,
            aisle_depth: row.get(4)?,
            aisle_height: row.get(5)?,
            aisle_section_width: row.get(6)?,
            aisle_sections: row.get(7)?,
        })
    }
}
