//! 审计日志实体定义
//!
//! 追加式日志记录，同时也是门禁限流的计数来源。

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 日志类型（封闭枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    DoorOpen,
    DoorOpenFailed,
    DoorOpenError,
    PartyCreated,
    PartyDeleted,
    PartyStatusChanged,
    PartyScheduleChanged,
    GuestAdded,
    GuestRemoved,
    GuestStatusChanged,
    Maintenance,
    RegistrationManagement,
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogType::DoorOpen => write!(f, "DOOR_OPEN"),
            LogType::DoorOpenFailed => write!(f, "DOOR_OPEN_FAILED"),
            LogType::DoorOpenError => write!(f, "DOOR_OPEN_ERROR"),
            LogType::PartyCreated => write!(f, "PARTY_CREATED"),
            LogType::PartyDeleted => write!(f, "PARTY_DELETED"),
            LogType::PartyStatusChanged => write!(f, "PARTY_STATUS_CHANGED"),
            LogType::PartyScheduleChanged => write!(f, "PARTY_SCHEDULE_CHANGED"),
            LogType::GuestAdded => write!(f, "GUEST_ADDED"),
            LogType::GuestRemoved => write!(f, "GUEST_REMOVED"),
            LogType::GuestStatusChanged => write!(f, "GUEST_STATUS_CHANGED"),
            LogType::Maintenance => write!(f, "MAINTENANCE"),
            LogType::RegistrationManagement => write!(f, "REGISTRATION_MANAGEMENT"),
        }
    }
}

/// 审计日志条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 日志ID
    pub id: Uuid,
    /// 触发日志的用户
    pub user_id: Uuid,
    /// 日志内容
    pub message: String,
    /// 日志类型
    pub log_type: LogType,
    /// 记录时间
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// 创建日志条目（内容至少 4 个字符）
    pub fn new(
        user_id: Uuid,
        message: impl Into<String>,
        log_type: LogType,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let message = message.into();
        if message.len() < 4 {
            return Err(DomainError::validation_error(
                "message",
                "日志内容至少4个字符",
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            message,
            log_type,
            created_at: now,
        })
    }
}
