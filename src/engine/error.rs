// ==========================================
// 门店货架空间规划 - 引擎层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    // ===== 参数错误（不产生任何写入） =====
    #[error("缺少规划模式")]
    MissingMode,

    #[error("未知规划模式: {0}")]
    InvalidMode(String),

    #[error("货架段未找到: aisle_id={0}")]
    AisleNotFound(i64),

    #[error("布局参数非法: {0}")]
    InvalidLayout(String),

    // ===== 致命错误（中止本次规划，已提交批次保留） =====
    #[error("不变量违反: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
