//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{AiError, FeedStoreError, IdentityError, RepositoryError};
use crate::domain::project::ProjectError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 与已有资源冲突
    #[error("{0}")]
    Conflict(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建业务规则违反错误
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound {
                resource_type: "Novel",
                id,
            },
            RepositoryError::Duplicate(msg) => Self::Conflict(msg),
            RepositoryError::Unavailable(msg) => Self::ExternalServiceError(msg),
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<AiError> for ApplicationError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::MissingApiKey(_) | AiError::InvalidApiKey(_) => {
                Self::ValidationError(err.to_string())
            }
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<FeedStoreError> for ApplicationError {
    fn from(err: FeedStoreError) -> Self {
        match err {
            FeedStoreError::NotFound(id) => Self::not_found("Feed", id),
        }
    }
}

impl From<IdentityError> for ApplicationError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Invalid(msg) => Self::ValidationError(msg),
            IdentityError::Io(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ProjectError> for ApplicationError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::SnapshotNotFound(id) => Self::not_found("Snapshot", id),
            ProjectError::InvalidTitle(msg) => Self::ValidationError(msg),
            ProjectError::Serialization(msg) => Self::InternalError(msg),
        }
    }
}
