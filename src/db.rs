// ==========================================
// 门店货架空间规划 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等的建表入口
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建全部业务表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS stores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_num INTEGER NOT NULL,
            store_loc TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS pairs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_id INTEGER NOT NULL REFERENCES stores(id),
            pair_nums TEXT NOT NULL,
            pair_depth REAL NOT NULL,
            pair_height REAL NOT NULL,
            pair_section_width REAL NOT NULL,
            pair_sections INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS aisles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pair_id INTEGER NOT NULL REFERENCES pairs(id),
            aisle_num TEXT NOT NULL,
            aisle_depth REAL NOT NULL,
            aisle_height REAL NOT NULL,
            aisle_section_width REAL NOT NULL,
            aisle_sections INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            aisle_id INTEGER NOT NULL REFERENCES aisles(id),
            section_num INTEGER NOT NULL,
            section_width REAL NOT NULL,
            section_depth REAL NOT NULL,
            section_height REAL NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_sections_aisle ON sections(aisle_id, section_num);

        CREATE TABLE IF NOT EXISTS levels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            section_id INTEGER NOT NULL REFERENCES sections(id),
            level_num TEXT NOT NULL,
            level_height REAL NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(section_id, level_num)
        );

        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_id INTEGER NOT NULL REFERENCES stores(id),
            artno INTEGER NOT NULL UNIQUE,
            artname TEXT,
            hfb TEXT,
            pa TEXT,
            sales_method TEXT,
            expsale REAL,
            rssq INTEGER,
            split_rssq INTEGER,
            mpq INTEGER,
            palq INTEGER,
            dt INTEGER,
            effective_dt INTEGER,
            weight_g REAL,
            cp_width REAL,
            cp_length REAL,
            cp_height REAL,
            ul_width REAL,
            ul_length REAL,
            ul_height REAL,
            planned INTEGER NOT NULL DEFAULT 0,
            part_planned INTEGER NOT NULL DEFAULT 0,
            planned_quantity_remainder INTEGER,
            section_id INTEGER REFERENCES sections(id),
            level_id INTEGER REFERENCES levels(id),
            plan_badge TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_articles_store ON articles(store_id, planned);
        CREATE INDEX IF NOT EXISTS idx_articles_level ON articles(level_id);

        CREATE TABLE IF NOT EXISTS placements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            article_id INTEGER NOT NULL REFERENCES articles(id),
            section_id INTEGER NOT NULL REFERENCES sections(id),
            level_id INTEGER NOT NULL REFERENCES levels(id),
            planned_qty REAL NOT NULL,
            width_used REAL NOT NULL,
            height_used REAL NOT NULL DEFAULT 0,
            badge TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_placements_article ON placements(article_id);
        CREATE INDEX IF NOT EXISTS idx_placements_level ON placements(level_id);
        "#,
    )?;
    migrate_placement_height(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// v1 → v2: placements 增加 height_used（落位时的有效高度）
fn migrate_placement_height(conn: &Connection) -> rusqlite::Result<()> {
    let has_column: bool = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info('placements') WHERE name = 'height_used'",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if !has_column {
        conn.execute_batch("ALTER TABLE placements ADD COLUMN height_used REAL NOT NULL DEFAULT 0;")?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_v1_placements_gain_height_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE placements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                section_id INTEGER NOT NULL,
                level_id INTEGER NOT NULL,
                planned_qty REAL NOT NULL,
                width_used REAL NOT NULL,
                badge TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            INSERT INTO placements (article_id, section_id, level_id, planned_qty, width_used)
            VALUES (1, 1, 1, 1.0, 500.0);
            "#,
        )
        .unwrap();

        init_schema(&conn).unwrap();
        let height: f64 = conn
            .query_row("SELECT height_used FROM placements WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(height, 0.0);
    }
}
