//! 存储接口定义
//!
//! 核心只要求一个支持简单谓词查询的持久化集合，
//! 具体引擎（内存、SQL）由实现决定。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{LogEntry, LogType, Notification, Party, Room, TimeRange, User};
use thiserror::Error;
use uuid::Uuid;

/// 存储层错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 记录不存在
    #[error("记录不存在")]
    NotFound,

    /// 存储引擎错误
    #[error("存储引擎错误: {0}")]
    Storage(String),
}

#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn create(&self, party: Party) -> Result<Party, RepositoryError>;
    async fn update(&self, party: Party) -> Result<Party, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Party>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Party>, RepositoryError>;

    /// 冲突查询：与给定房间集合共享房间、时间重叠且未取消的活动。
    /// `exclude` 用于改期时排除活动自身。
    async fn find_conflicting(
        &self,
        rooms: &[Room],
        range: &TimeRange,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Party>, RepositoryError>;

    /// 用户参与（主办或受邀）的所有活动
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Party>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn append(&self, entry: LogEntry) -> Result<LogEntry, RepositoryError>;

    /// 统计某用户某类型日志在给定时刻之后的条数（门禁限流的计数来源）
    async fn count_since(
        &self,
        user_id: Uuid,
        log_type: LogType,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// 最近的日志条目，按时间倒序
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn save(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, RepositoryError>;
    async fn mark_as_read(
        &self,
        notification_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
