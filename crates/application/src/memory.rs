//! 内存存储实现
//!
//! `Arc<RwLock<HashMap>>` 形式的简单存储，供单机部署与测试使用。
//! 每条记录的写入都是原子的；跨记录的排期冲突约束由服务层的
//! 排期锁保证。

use crate::repository::{
    LogRepository, NotificationRepository, PartyRepository, RepositoryError, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{LogEntry, LogType, Notification, Party, Room, TimeRange, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 内存活动存储
#[derive(Default)]
pub struct InMemoryPartyRepository {
    parties: Arc<RwLock<HashMap<Uuid, Party>>>,
}

impl InMemoryPartyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartyRepository for InMemoryPartyRepository {
    async fn create(&self, party: Party) -> Result<Party, RepositoryError> {
        let mut parties = self.parties.write().await;
        parties.insert(party.id, party.clone());
        Ok(party)
    }

    async fn update(&self, party: Party) -> Result<Party, RepositoryError> {
        let mut parties = self.parties.write().await;
        if !parties.contains_key(&party.id) {
            return Err(RepositoryError::NotFound);
        }
        parties.insert(party.id, party.clone());
        Ok(party)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut parties = self.parties.write().await;
        parties.remove(&id).ok_or(RepositoryError::NotFound)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Party>, RepositoryError> {
        let parties = self.parties.read().await;
        Ok(parties.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Party>, RepositoryError> {
        let parties = self.parties.read().await;
        let mut all: Vec<Party> = parties.values().cloned().collect();
        all.sort_by_key(|p| p.schedule.start);
        Ok(all)
    }

    async fn find_conflicting(
        &self,
        rooms: &[Room],
        range: &TimeRange,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Party>, RepositoryError> {
        let parties = self.parties.read().await;
        Ok(parties
            .values()
            .filter(|p| Some(p.id) != exclude && p.occupies(rooms, range))
            .cloned()
            .collect())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Party>, RepositoryError> {
        let parties = self.parties.read().await;
        Ok(parties
            .values()
            .filter(|p| p.involves(user_id))
            .cloned()
            .collect())
    }
}

/// 内存用户存储
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }
}

/// 内存审计日志存储（追加式）
#[derive(Default)]
pub struct InMemoryLogRepository {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl InMemoryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogRepository for InMemoryLogRepository {
    async fn append(&self, entry: LogEntry) -> Result<LogEntry, RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        log_type: LogType,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id && e.log_type == log_type && e.created_at > since)
            .count() as u64)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut all: Vec<LogEntry> = entries.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }
}

/// 内存通知存储
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn save(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.read().await;
        let mut found: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_as_read(
        &self,
        notification_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .get_mut(&notification_id)
            .ok_or(RepositoryError::NotFound)?;
        notification.mark_as_read(now);
        Ok(())
    }
}
