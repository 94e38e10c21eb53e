// ==========================================
// 门店货架空间规划 - 货位分配数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: placements 表 + 层板批次提交（层板/货位/商品状态同事务）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::placement::{ArticleRestate, LevelCommit, Placement};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// PlacementRepository - 货位分配仓储
// ==========================================
pub struct PlacementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlacementRepository {
    /// 创建新的货位分配仓储实例
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
    // 批次提交
    // ==========================================

    /// 提交一个层板批次（单事务）
    ///
    /// 步骤:
    /// 1) 层板 upsert，层高取 max(已有, 新值)
    /// 2) 删除商品在其他层板残留的 placements（部分规划商品整体迁移）
    /// 3) 写入 placements
    /// 4) 商品置为已规划，写入货位与徽章，冻结 effective_dt
    ///
    /// # 返回
    /// - Ok(i64): 层板ID
    pub fn commit_level_batch(&self, batch: &LevelCommit) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let level_code = batch.level_num.as_code();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM levels WHERE section_id = ?1 AND level_num = ?2",
                params![batch.section_id, level_code],
                |row| row.get(0),
            )
            .optional()?;

        let level_id = match existing {
            Some(id) => {
                tx.execute(
                    r#"
                    UPDATE levels
                    SET level_height = MAX(level_height, ?2),
                        updated_at = datetime('now')
                    WHERE id = ?1
                    "#,
                    params![id, batch.level_height],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO levels (section_id, level_num, level_height) VALUES (?1, ?2, ?3)",
                    params![batch.section_id, level_code, batch.level_height],
                )?;
                tx.last_insert_rowid()
            }
        };

        {
            let mut stale_stmt = tx.prepare("DELETE FROM placements WHERE article_id = ?1")?;
            let mut insert_stmt = tx.prepare(
                r#"
                INSERT INTO placements (
                    article_id, section_id, level_id, planned_qty, width_used, height_used, badge
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            let mut article_stmt = tx.prepare(
                r#"
                UPDATE articles
                SET section_id = ?2,
                    level_id = ?3,
                    plan_badge = ?4,
                    planned = 1,
                    part_planned = 0,
                    planned_quantity_remainder = 0,
                    effective_dt = COALESCE(effective_dt, dt),
                    updated_at = datetime('now')
                WHERE id = ?1
                "#,
            )?;

            for placed in &batch.placements {
                stale_stmt.execute(params![placed.article_id])?;
                insert_stmt.execute(params![
                    placed.article_id,
                    batch.section_id,
                    level_id,
                    placed.planned_qty,
                    placed.width_used,
                    placed.height_used,
                    placed.badge,
                ])?;
                let affected = article_stmt.execute(params![
                    placed.article_id,
                    batch.section_id,
                    level_id,
                    placed.badge,
                ])?;
                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "Article".to_string(),
                        id: placed.article_id.to_string(),
                    });
                }
            }
        }

        tx.commit()?;
        Ok(level_id)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, placement_id: i64) -> RepositoryResult<Option<Placement>> {
        let conn = self.get_conn()?;
        let placement = conn
            .query_row(
                r#"
                SELECT id, article_id, section_id, level_id, planned_qty, width_used, height_used, badge
                FROM placements
                WHERE id = ?1
                "#,
                params![placement_id],
                Self::map_row,
            )
            .optional()?;
        Ok(placement)
    }

    pub fn list_by_article(&self, article_id: i64) -> RepositoryResult<Vec<Placement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, article_id, section_id, level_id, planned_qty, width_used, height_used, badge
            FROM placements
            WHERE article_id = ?1
            ORDER BY id
            "#,
        )?;
        let placements = stmt
            .query_map(params![article_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Placement>>>()?;
        Ok(placements)
    }

    pub fn list_by_level(&self, level_id: i64) -> RepositoryResult<Vec<Placement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, article_id, section_id, level_id, planned_qty, width_used, height_used, badge
            FROM placements
            WHERE level_id = ?1
            ORDER BY id
            "#,
        )?;
        let placements = stmt
            .query_map(params![level_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Placement>>>()?;
        Ok(placements)
    }

    /// 层板已用宽度
    pub fn used_width_by_level(&self, level_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let used: f64 = conn.query_row(
            "SELECT COALESCE(SUM(width_used), 0.0) FROM placements WHERE level_id = ?1",
            params![level_id],
            |row| row.get(0),
        )?;
        Ok(used)
    }

    /// 层板上商品的最高有效高度（落位时记录）
    pub fn max_height_by_level(&self, level_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let height: f64 = conn.query_row(
            "SELECT COALESCE(MAX(height_used), 0.0) FROM placements WHERE level_id = ?1",
            params![level_id],
            |row| row.get(0),
        )?;
        Ok(height)
    }

    /// 商品已分配数量合计
    pub fn sum_qty_by_article(&self, article_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sum: f64 = conn.query_row(
            "SELECT COALESCE(SUM(planned_qty), 0.0) FROM placements WHERE article_id = ?1",
            params![article_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 取消单个商品的全部分配（单事务）
    ///
    /// 步骤: 删除 placements → 商品置为未规划，剩余数量回到稳定化销量
    ///
    /// # 返回
    /// - Ok(usize): 删除的 placement 数
    pub fn unassign_article(&self, article_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM placements WHERE article_id = ?1",
            params![article_id],
        )?;
        let affected = tx.execute(
            r#"
            UPDATE articles
            SET section_id = NULL,
                level_id = NULL,
                plan_badge = NULL,
                planned = 0,
                part_planned = 0,
                planned_quantity_remainder = COALESCE(split_rssq, rssq),
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![article_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Article".to_string(),
                id: article_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(removed)
    }

    /// 删除单个 placement 并写入商品的新规划状态（单事务）
    ///
    /// 状态由调用方按剩余 placements 推导；任一步失败整体回滚
    pub fn unassign_placement(
        &self,
        placement_id: i64,
        article_id: i64,
        restated: &ArticleRestate,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM placements WHERE id = ?1 AND article_id = ?2",
            params![placement_id, article_id],
        )?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Placement".to_string(),
                id: placement_id.to_string(),
            });
        }

        let (section_id, level_id) = match restated.location {
            Some((s, l)) => (Some(s), Some(l)),
            None => (None, None),
        };
        let affected = tx.execute(
            r#"
            UPDATE articles
            SET planned = ?2,
                part_planned = ?3,
                planned_quantity_remainder = ?4,
                section_id = ?5,
                level_id = ?6,
                plan_badge = ?7,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                article_id,
                restated.planned as i32,
                restated.part_planned as i32,
                restated.remainder,
                section_id,
                level_id,
                restated.plan_badge,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Article".to_string(),
                id: article_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    /// 清空若干货架格（单事务）
    ///
    /// 步骤: 商品置为未规划 → 删除 placements → 删除层板
    ///
    /// # 返回
    /// - Ok(usize): 被清空的商品数
    pub fn clear_sections(&self, section_ids: &[i64]) -> RepositoryResult<usize> {
        if section_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let placeholders = vec!["?"; section_ids.len()].join(", ");

        let cleared = tx.execute(
            &format!(
                r#"
                UPDATE articles
                SET section_id = NULL,
                    level_id = NULL,
                    plan_badge = NULL,
                    planned = 0,
                    part_planned = 0,
                    planned_quantity_remainder = COALESCE(split_rssq, rssq),
                    updated_at = datetime('now')
                WHERE section_id IN ({0})
                   OR id IN (SELECT article_id FROM placements WHERE section_id IN ({0}))
                "#,
                placeholders
            ),
            params_from_iter(section_ids.iter().chain(section_ids.iter())),
        )?;
        tx.execute(
            &format!("DELETE FROM placements WHERE section_id IN ({})", placeholders),
            params_from_iter(section_ids.iter()),
        )?;
        tx.execute(
            &format!("DELETE FROM levels WHERE section_id IN ({})", placeholders),
            params_from_iter(section_ids.iter()),
        )?;

        tx.commit()?;
        Ok(cleared)
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<Placement> {
        Ok(Placement {
            id: row.get(0)?,
            article_id: row.get(1)?,
            section_id: row.get(2)?,
            level_id: row.get(3)?,
            planned_qty: row.get(4)?,
            width_used: row.get(5)?,
            height_used: row.get(6)?,
            badge: row.get(7)?,
        })
    }
}
