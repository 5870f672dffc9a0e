// ==========================================
// 外勤医师排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一 Schema 建表入口（本系统规模小，不引入迁移脚本体系）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
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

/// 初始化数据库 Schema（幂等）
///
/// 表一览:
/// - doctor: 医师主数据
/// - clinic: 外勤先主数据
/// - affinity: 医师×外勤先 优先度（无行 = 默认 1.0）
/// - clinic_date_override: 日别人数设定（仅保存非默认值）
/// - preference: 月别希望（JSON 列在仓储层解析为强类型）
/// - schedule_plan: 月别排班方案（同月同名幂等覆盖）
/// - config_kv: 全局配置（权重/求解参数）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS doctor (
            doctor_id       INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL UNIQUE,
            account         TEXT NOT NULL DEFAULT '',
            is_active       INTEGER NOT NULL DEFAULT 1,
            max_assignments INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS clinic (
            clinic_id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name              TEXT NOT NULL UNIQUE,
            fee               INTEGER NOT NULL DEFAULT 0,
            frequency         TEXT NOT NULL DEFAULT 'weekly',
            is_active         INTEGER NOT NULL DEFAULT 1,
            nominated_doctors TEXT NOT NULL DEFAULT '[]',
            fixed_doctors     TEXT NOT NULL DEFAULT '[]',
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS affinity (
            doctor_id INTEGER NOT NULL,
            clinic_id INTEGER NOT NULL,
            weight    REAL NOT NULL DEFAULT 1.0,
            PRIMARY KEY (doctor_id, clinic_id)
        );

        CREATE TABLE IF NOT EXISTS clinic_date_override (
            clinic_id        INTEGER NOT NULL,
            date             TEXT NOT NULL,
            required_doctors INTEGER NOT NULL,
            PRIMARY KEY (clinic_id, date)
        );

        CREATE TABLE IF NOT EXISTS preference (
            doctor_id            INTEGER NOT NULL,
            year_month           TEXT NOT NULL,
            ng_dates             TEXT NOT NULL DEFAULT '[]',
            avoid_dates          TEXT NOT NULL DEFAULT '[]',
            preferred_clinics    TEXT NOT NULL DEFAULT '[]',
            date_clinic_requests TEXT NOT NULL DEFAULT '{}',
            free_text            TEXT NOT NULL DEFAULT '',
            updated_at           TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (doctor_id, year_month)
        );

        CREATE TABLE IF NOT EXISTS schedule_plan (
            plan_id            TEXT PRIMARY KEY,
            year_month         TEXT NOT NULL,
            plan_name          TEXT NOT NULL,
            assignments        TEXT NOT NULL DEFAULT '[]',
            total_variance     REAL NOT NULL DEFAULT 0,
            satisfaction_score REAL NOT NULL DEFAULT 0,
            has_shortage       INTEGER NOT NULL DEFAULT 0,
            is_confirmed       INTEGER NOT NULL DEFAULT 0,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            UNIQUE (year_month, plan_name)
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_plan_month
            ON schedule_plan (year_month);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;
    Ok(())
}
