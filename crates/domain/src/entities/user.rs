//! 用户实体定义
//!
//! 包含用户的核心信息、角色能力表以及门禁相关的个人开关。

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 用户角色枚举
///
/// 角色的权限差异全部收敛在下面的能力方法里，
/// 调用方不直接比较角色值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// 管理员（特权角色，可越过静音/维护/成员门槛）
    Admin,
    /// 住户（免成员门槛，但受静音与维护模式约束）
    Resident,
    /// 访客（仅凭进行中的活动邀请开门）
    Guest,
}

impl UserRole {
    /// 被静音时是否仍可操作
    pub fn can_override_mute(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// 维护模式下是否仍可开门
    pub fn bypasses_maintenance(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// 是否免活动成员资格检查
    pub fn bypasses_membership_gate(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Resident)
    }

    /// 是否可以创建活动
    pub fn can_host_parties(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Resident)
    }

    /// 是否可以管理任意活动（改状态、改排期、删除、管理宾客）
    pub fn manages_any_party(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// 是否可以切换全局开关（维护模式、注册封锁）
    pub fn manages_house(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// 开门通知的默认受众（非维护模式）
    pub fn in_door_audience(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Resident)
    }

    /// 是否能看到所有活动（含已结束）
    pub fn sees_all_parties(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// 是否能看到全部未结束的活动（访客只看自己受邀的）
    pub fn sees_future_parties(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Resident)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Resident => write!(f, "resident"),
            UserRole::Guest => write!(f, "guest"),
        }
    }
}

/// 用户实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// 用户唯一ID
    pub id: Uuid,
    /// 用户名（唯一）
    pub username: String,
    /// 邮箱（唯一）
    pub email: String,
    /// 角色
    pub role: UserRole,
    /// 是否被静音（静音用户不能开门、不能管理活动）
    pub muted: bool,
    /// 多重门权限：满足路程条件时允许联动开内门
    pub multi_door: bool,
    /// 生日（可选，用于生日问候）
    pub birthdate: Option<NaiveDate>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 创建新用户
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let username = username.into();
        let email = email.into();

        Self::validate_username(&username)?;
        Self::validate_email(&email)?;

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            role,
            muted: false,
            multi_door: false,
            birthdate: None,
            created_at: now,
        })
    }

    /// 今天是否为该用户生日（比较月、日）
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.birthdate
            .map(|b| b.month() == date.month() && b.day() == date.day())
            .unwrap_or(false)
    }

    /// 验证用户名格式
    fn validate_username(username: &str) -> DomainResult<()> {
        if username.is_empty() {
            return Err(DomainError::validation_error("username", "用户名不能为空"));
        }

        if username.len() < 2 {
            return Err(DomainError::validation_error(
                "username",
                "用户名长度至少2个字符",
            ));
        }

        if username.len() > 50 {
            return Err(DomainError::validation_error(
                "username",
                "用户名长度不能超过50个字符",
            ));
        }

        // 只允许字母、数字、下划线和连字符
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DomainError::validation_error(
                "username",
                "用户名只能包含字母、数字、下划线和连字符",
            ));
        }

        Ok(())
    }

    /// 验证邮箱格式
    fn validate_email(email: &str) -> DomainResult<()> {
        if email.is_empty() {
            return Err(DomainError::validation_error("email", "邮箱不能为空"));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(DomainError::validation_error("email", "邮箱格式不正确"));
        }

        if email.len() > 255 {
            return Err(DomainError::validation_error(
                "email",
                "邮箱长度不能超过255个字符",
            ));
        }

        Ok(())
    }
}
