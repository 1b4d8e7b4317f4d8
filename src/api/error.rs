// ==========================================
// 剧院制作后台 - API层错误类型
// ==========================================
// 职责: 定义工作流错误分类, 转换Repository错误为用户友好的错误消息
// 约定: 每个错误同时提供机器可判定的 code() 与本地化的 localized_message()
// ==========================================

use crate::engine::transition::TransitionViolation;
use crate::i18n::t_with_args;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("无权操作: {0}")]
    Unauthorized(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("无效数量: {0}")]
    InvalidQuantity(String),

    #[error("库存不足: item_id={item_id}, available={available}, requested={requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    #[error("演员未分配到该剧目: play_id={play_id}, actor_id={actor_id}")]
    NotAssigned { play_id: String, actor_id: String },

    #[error("已有待审批的申领: play_id={play_id}, actor_id={actor_id}")]
    DuplicatePending { play_id: String, actor_id: String },

    #[error("付款已由供应商确认: order_id={0}")]
    AlreadyConfirmed(String),

    #[error("订单尚未付款: order_id={order_id}, payment_status={payment_status}")]
    NotYetPaid {
        order_id: String,
        payment_status: String,
    },

    #[error("已付款订单不可撤销: order_id={0}")]
    CannotCancelPaid(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误 (对外统一为 PERSISTENCE_ERROR)
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 机器可判定的错误类别
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidStateTransition { .. } => "INVALID_TRANSITION",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InvalidQuantity(_) => "INVALID_QUANTITY",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::NotAssigned { .. } => "NOT_ASSIGNED",
            ApiError::DuplicatePending { .. } => "DUPLICATE_PENDING",
            ApiError::AlreadyConfirmed(_) => "ALREADY_CONFIRMED",
            ApiError::NotYetPaid { .. } => "NOT_YET_PAID",
            ApiError::CannotCancelPaid(_) => "CANNOT_CANCEL_PAID",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::OptimisticLockFailure(_) => "OPTIMISTIC_LOCK_FAILURE",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "PERSISTENCE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 配置读取失败 (config_kv 属于存储层)
    pub(crate) fn config_read(err: Box<dyn std::error::Error>) -> Self {
        ApiError::DatabaseError(format!("配置读取失败: {}", err))
    }

    /// 操作结果不确定, 调用方需重新读取状态
    pub fn is_persistence_failure(&self) -> bool {
        self.code() == "PERSISTENCE_ERROR"
    }

    /// 本地化错误消息 (跟随当前 locale)
    pub fn localized_message(&self) -> String {
        let key = format!("errors.{}", self.code().to_lowercase());
        match self {
            ApiError::InvalidStateTransition { from, to } => {
                t_with_args(&key, &[("from", from), ("to", to)])
            }
            ApiError::InsufficientStock {
                item_id,
                available,
                requested,
            } => t_with_args(
                &key,
                &[
                    ("item_id", item_id),
                    ("available", &available.to_string()),
                    ("requested", &requested.to_string()),
                ],
            ),
            ApiError::NotAssigned { play_id, actor_id }
            | ApiError::DuplicatePending { play_id, actor_id } => {
                t_with_args(&key, &[("play_id", play_id), ("actor_id", actor_id)])
            }
            ApiError::NotYetPaid {
                order_id,
                payment_status,
            } => t_with_args(
                &key,
                &[("order_id", order_id), ("payment_status", payment_status)],
            ),
            ApiError::NotFound(detail)
            | ApiError::Unauthorized(detail)
            | ApiError::InvalidInput(detail)
            | ApiError::InvalidQuantity(detail)
            | ApiError::AlreadyConfirmed(detail)
            | ApiError::CannotCancelPaid(detail)
            | ApiError::BusinessRuleViolation(detail)
            | ApiError::OptimisticLockFailure(detail)
            | ApiError::DatabaseError(detail)
            | ApiError::DatabaseConnectionError(detail)
            | ApiError::DatabaseTransactionError(detail)
            | ApiError::InternalError(detail) => t_with_args(&key, &[("detail", detail)]),
            ApiError::Other(err) => t_with_args(&key, &[("detail", &err.to_string())]),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "{}(id={})已被其他用户修改（期望revision={}，实际revision={}）",
                entity, id, expected, actual
            )),

            // 库存
            RepositoryError::InsufficientStock {
                item_id,
                available,
                requested,
            } => ApiError::InsufficientStock {
                item_id,
                available,
                requested,
            },

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("检查约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::SerializationError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<TransitionViolation> for ApiError {
    fn from(v: TransitionViolation) -> Self {
        ApiError::InvalidStateTransition { from: v.from, to: v.to }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
