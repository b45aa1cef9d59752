//! 通知实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 通知类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationCategory {
    /// 系统通知（维护模式、注册封锁、生日等）
    System,
    /// 活动相关通知（邀请、提醒、状态变化）
    Party,
    /// 门禁通知（开门播报）
    Doorbell,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationCategory::System => write!(f, "system"),
            NotificationCategory::Party => write!(f, "party"),
            NotificationCategory::Doorbell => write!(f, "doorbell"),
        }
    }
}

/// 通知实体（仪表盘存储记录，推送投递在系统边界之外）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 通知ID
    pub id: Uuid,
    /// 接收用户ID
    pub user_id: Uuid,
    /// 标题
    pub title: String,
    /// 内容
    pub message: String,
    /// 类别
    pub category: NotificationCategory,
    /// 关联活动（可选）
    pub party_id: Option<Uuid>,
    /// 是否已读
    pub is_read: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 阅读时间
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// 创建新通知
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
        category: NotificationCategory,
        party_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            message: message.into(),
            category,
            party_id,
            is_read: false,
            created_at: now,
            read_at: None,
        }
    }

    /// 标记为已读
    pub fn mark_as_read(&mut self, now: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_as_read_is_idempotent() {
        let now = Utc::now();
        let mut n = Notification::new(
            Uuid::new_v4(),
            "Door Opened",
            "The door was opened by anna",
            NotificationCategory::Doorbell,
            None,
            now,
        );
        assert!(!n.is_read);

        n.mark_as_read(now);
        let first_read_at = n.read_at;
        assert!(n.is_read);

        n.mark_as_read(now + chrono::Duration::seconds(5));
        assert_eq!(n.read_at, first_read_at);
    }
}
