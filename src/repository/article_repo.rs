// ==========================================
// 门店货架空间规划 - 商品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::article::Article;
use crate::domain::types::DistributionType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const ARTICLE_COLUMNS: &str = r#"
    id, store_id, artno, artname, hfb, pa, sales_method, expsale,
    rssq, split_rssq, mpq, palq, dt, effective_dt,
    weight_g, cp_width, cp_length, cp_height, ul_width, ul_length, ul_height,
    planned, part_planned, planned_quantity_remainder, section_id, level_id, plan_badge
"#;

// ==========================================
// ArticleRepository - 商品仓储
// ==========================================

/// 商品仓储
/// 职责: 管理 articles 表的 CRUD 操作
pub struct ArticleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ArticleRepository {
    /// 创建新的商品仓储实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入单个商品（split_rssq 缺失时取 rssq）
    ///
    /// # 返回
    /// - Ok(i64): 新记录ID
    pub fn insert(&self, article: &Article) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, article)
    }

    /// 批量插入商品
    pub fn batch_insert(&self, articles: &[Article]) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(articles.len());
        for article in articles {
            ids.push(Self::insert_with(&tx, article)?);
        }
        tx.commit()?;
        Ok(ids)
    }

    fn insert_with(conn: &Connection, article: &Article) -> RepositoryResult<i64> {
        let article = article.clone().with_default_split_rssq();
        conn.execute(
            r#"
            INSERT INTO articles (
                store_id, artno, artname, hfb, pa, sales_method, expsale,
                rssq, split_rssq, mpq, palq, dt, effective_dt,
                weight_g, cp_width, cp_length, cp_height, ul_width, ul_length, ul_height,
                planned, part_planned, planned_quantity_remainder, section_id, level_id, plan_badge
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
            )
            "#,
            params![
                article.store_id,
                article.artno,
                article.name,
                article.hfb,
                article.pa,
                article.sales_method,
                article.expsale,
                article.rssq,
                article.split_rssq,
                article.mpq,
                article.palq,
                article.dt.map(|d| d.code()),
                article.effective_dt.map(|d| d.code()),
                article.weight_g,
                article.cp_width,
                article.cp_length,
                article.cp_height,
                article.ul_width,
                article.ul_length,
                article.ul_height,
                article.planned as i32,
                article.part_planned as i32,
                article.planned_quantity_remainder,
                article.section_id,
                article.level_id,
                article.plan_badge,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询商品
    pub fn find_by_id(&self, article_id: i64) -> RepositoryResult<Option<Article>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS);
        let article = conn
            .query_row(&sql, params![article_id], Self::map_row)
            .optional()?;
        Ok(article)
    }

    /// 查询门店内尚未规划的商品（按ID排序，保证规划顺序可复现）
    pub fn find_unplanned_by_store(&self, store_id: i64) -> RepositoryResult<Vec<Article>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM articles WHERE store_id = ?1 AND planned = 0 ORDER BY id",
            ARTICLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(params![store_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Article>>>()?;
        Ok(articles)
    }

    /// 查询门店全部商品
    pub fn find_by_store(&self, store_id: i64) -> RepositoryResult<Vec<Article>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM articles WHERE store_id = ?1 ORDER BY id",
            ARTICLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(params![store_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Article>>>()?;
        Ok(articles)
    }

    /// 查询当前位于某层板的商品
    pub fn find_by_level(&self, level_id: i64) -> RepositoryResult<Vec<Article>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM articles WHERE level_id = ?1 ORDER BY id",
            ARTICLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(params![level_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Article>>>()?;
        Ok(articles)
    }

    /// 查询当前位于若干货架格内的商品
    pub fn find_by_sections(&self, section_ids: &[i64]) -> RepositoryResult<Vec<Article>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; section_ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM articles WHERE section_id IN ({}) ORDER BY id",
            ARTICLE_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(params_from_iter(section_ids.iter()), Self::map_row)?
            .collect::<SqliteResult<Vec<Article>>>()?;
        Ok(articles)
    }

    /// 行映射
    pub(crate) fn map_row(row: &rusqlite::Row) -> SqliteResult<Article> {
        Ok(Article {
            id: row.get(0)?,
            store_id: row.get(1)?,
            artno: row.get(2)?,
            name: row.get(3)?,
            hfb: row.get(4)?,
            pa: row.get(5)?,
            sales_method: row.get(6)?,
            expsale: row.get(7)?,
            rssq: row.get(8)?,
            split_rssq: row.get(9)?,
            mpq: row.get(10)?,
            palq: row.get(11)?,
            dt: row
                .get::<_, Option<i64>>(12)?
                .and_then(DistributionType::from_code),
            effective_dt: row
                .get::<_, Option<i64>>(13)?
                .and_then(DistributionType::from_code),
            weight_g: row.get(14)?,
            cp_width: row.get(15)?,
            cp_length: row.get(16)?,
            cp_height: row.get(17)?,
            ul_width: row.get(18)?,
            ul_length: row.get(19)?,
            ul_height: row.get(20)?,
            planned: row.get::<_, i32>(21)? != 0,
            part_planned: row.get::<_, i32>(22)? != 0,
            planned_quantity_remainder: row.get(23)?,
            section_id: row.get(24)?,
            level_id: row.get(25)?,
            plan_badge: row.get(26)?,
        })
    }
}
