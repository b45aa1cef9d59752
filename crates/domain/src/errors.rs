//! 领域模型错误定义
//!
//! 门禁与活动领域共用的错误类型；带辅助构造器，
//! 方便在实体校验与业务规则处直接构造。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 字段校验错误
    #[error("校验失败: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 权限错误
    #[error("没有权限执行: {action}")]
    PermissionDenied { action: String },

    /// 资源不存在错误
    #[error("找不到{resource_type}: {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// 业务规则违反错误
    #[error("违反业务规则: {rule}")]
    BusinessRuleViolation { rule: String },
}

impl DomainError {
    /// 创建校验错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建权限错误
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn resource_not_found(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// 创建业务规则违反错误
    pub fn business_rule_violation(rule: impl Into<String>) -> Self {
        Self::BusinessRuleViolation { rule: rule.into() }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
