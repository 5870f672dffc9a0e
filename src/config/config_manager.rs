// ==========================================
// 外勤医师排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::config::weight_profile::WeightProfile;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（scope_id='global'，幂等覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
               ON CONFLICT (scope_id, key) DO UPDATE SET value = excluded.value"#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取成本模型权重（缺失/损坏时回退默认值，不中断排班）
    pub fn get_weight_profile(&self) -> RepositoryResult<WeightProfile> {
        let raw = match self.get_config_value(config_keys::WEIGHT_PROFILE)? {
            Some(v) => v,
            None => return Ok(WeightProfile::default()),
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                warn!(
                    config_key = config_keys::WEIGHT_PROFILE,
                    error = %e,
                    "权重配置解析失败，回退默认值"
                );
                Ok(WeightProfile::default())
            }
        }
    }

    /// 保存成本模型权重
    pub fn set_weight_profile(&self, profile: &WeightProfile) -> RepositoryResult<()> {
        let raw = serde_json::to_string(profile)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        self.set_config_value(config_keys::WEIGHT_PROFILE, &raw)
    }

    /// 局部搜索改善轮数上限
    pub fn get_refine_pass_budget(&self) -> RepositoryResult<usize> {
        let value =
            self.get_config_value(config_keys::REFINE_PASS_BUDGET)?
                .unwrap_or_default();
        Ok(value.parse().unwrap_or(DEFAULT_REFINE_PASS_BUDGET))
    }
}

/// 局部搜索改善轮数默认上限
///
/// 实例规模为数十医师×数十槽位，1000 轮足以收敛
pub const DEFAULT_REFINE_PASS_BUDGET: usize = 1000;

// ==========================================
// 配置键定义
// ==========================================
pub mod config_keys {
    /// 成本模型权重 (JSON, WeightProfile)
    pub const WEIGHT_PROFILE: &str = "weight_profile";

    /// 局部搜索改善轮数上限
    pub const REFINE_PASS_BUDGET: &str = "refine_pass_budget";
}
