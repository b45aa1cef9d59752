//! 活动服务
//!
//! 实现活动的核心业务逻辑：创建、查询、状态覆盖、宾客管理、
//! 改期与删除。所有读路径先应用自动状态推导并持久化变化，
//! 冲突检查与写入在排期锁内完成。

use crate::clock::Clock;
use crate::errors::{ApplicationError, ApplicationResult, PartyError};
use crate::repository::{LogRepository, PartyRepository, UserRepository};
use crate::services::notification_service::NotificationService;
use chrono::{DateTime, Utc};
use domain::{
    AttendanceStatus, LogEntry, LogType, Party, PartyCategory, PartyStatus, Room, TimeRange,
    User,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// 创建活动请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartyRequest {
    /// 活动名称
    pub name: String,
    /// 活动描述
    pub description: Option<String>,
    /// 占用的房间
    pub rooms: Vec<Room>,
    /// 开始时间
    pub start: DateTime<Utc>,
    /// 结束时间
    pub end: DateTime<Utc>,
    /// 类别
    pub category: PartyCategory,
    /// 受邀宾客
    pub guest_ids: Vec<Uuid>,
}

/// 活动服务依赖
pub struct PartyServiceDependencies {
    pub party_repository: Arc<dyn PartyRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub log_repository: Arc<dyn LogRepository>,
    pub notifier: Arc<NotificationService>,
    pub clock: Arc<dyn Clock>,
}

/// 活动服务
pub struct PartyService {
    party_repository: Arc<dyn PartyRepository>,
    user_repository: Arc<dyn UserRepository>,
    log_repository: Arc<dyn LogRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    /// 排期锁：冲突检查与写入必须是一个不可分割的步骤，
    /// 否则两个并发预订可能都通过检查
    scheduling_lock: Mutex<()>,
}

impl PartyService {
    pub fn new(deps: PartyServiceDependencies) -> Self {
        Self {
            party_repository: deps.party_repository,
            user_repository: deps.user_repository,
            log_repository: deps.log_repository,
            notifier: deps.notifier,
            clock: deps.clock,
            scheduling_lock: Mutex::new(()),
        }
    }

    /// 创建活动
    pub async fn create_party(
        &self,
        host: &User,
        request: CreatePartyRequest,
    ) -> ApplicationResult<Party> {
        if !host.role.can_host_parties() {
            return Err(PartyError::InsufficientPermissions(
                "访客不能创建活动".to_string(),
            )
            .into());
        }
        if host.muted && !host.role.can_override_mute() {
            return Err(PartyError::MutedUser("静音用户不能创建活动".to_string()).into());
        }

        let now = self.clock.now();
        let schedule = TimeRange::new(request.start, request.end)?;
        let mut party = Party::new(
            host.id,
            request.name,
            request.description,
            request.rooms,
            schedule,
            request.category,
            now,
        )?;

        // 宾客必须是已存在的用户，邀请从未定状态开始
        for guest_id in &request.guest_ids {
            self.user_repository
                .find_by_id(*guest_id)
                .await?
                .ok_or_else(|| ApplicationError::NotFound(format!("宾客用户不存在: {}", guest_id)))?;
            party.add_guest(*guest_id, now)?;
        }

        // 冲突检查与写入在同一把锁内
        let created = {
            let _guard = self.scheduling_lock.lock().await;
            let conflicts = self
                .party_repository
                .find_conflicting(&party.rooms, &party.schedule, None)
                .await?;
            if !conflicts.is_empty() {
                return Err(PartyError::ScheduleConflict {
                    conflicts: conflicts.len(),
                }
                .into());
            }
            self.party_repository.create(party).await?
        };

        self.append_log(
            host,
            format!(
                "User {} created party: {} ({})",
                host.username, created.name, created.category
            ),
            LogType::PartyCreated,
        )
        .await?;

        let guest_ids: Vec<Uuid> = created.guests.iter().map(|g| g.user_id).collect();
        self.notifier
            .send_party_invitation(&created, &guest_ids)
            .await?;

        info!("活动创建成功: {} ({})", created.name, created.id);
        Ok(created)
    }

    /// 按角色可见性列出活动（先应用自动状态推导）
    pub async fn list_parties(&self, viewer: &User) -> ApplicationResult<Vec<Party>> {
        let now = self.clock.now();
        let mut parties = Vec::new();
        for mut party in self.party_repository.find_all().await? {
            self.refresh_and_persist(&mut party, now).await?;
            parties.push(party);
        }

        let visible = parties
            .into_iter()
            .filter(|p| Self::is_visible_to(p, viewer, now))
            .collect();
        Ok(visible)
    }

    /// 按可见性读取单个活动
    pub async fn get_party(&self, id: Uuid, viewer: &User) -> ApplicationResult<Party> {
        let now = self.clock.now();
        let mut party = self.find_party(id).await?;
        self.refresh_and_persist(&mut party, now).await?;

        if !Self::is_visible_to(&party, viewer, now) {
            return Err(ApplicationError::Unauthorized(
                "你没有权限查看该活动".to_string(),
            ));
        }
        Ok(party)
    }

    /// 手动覆盖活动状态（主办人或管理员；覆盖值原样持久化）
    pub async fn update_status(
        &self,
        id: Uuid,
        requester: &User,
        new_status: PartyStatus,
    ) -> ApplicationResult<Party> {
        let mut party = self.find_party(id).await?;
        self.ensure_can_manage(&party, requester, "修改活动状态")?;

        let old_status = party.status;
        party.status = new_status;
        let saved = self.party_repository.update(party).await?;

        self.append_log(
            requester,
            format!(
                "{} changed party status from {} to {} for party: {}",
                requester.username, old_status, new_status, saved.name
            ),
            LogType::PartyStatusChanged,
        )
        .await?;

        self.notifier
            .send_party_status_changed(&saved, new_status)
            .await?;
        Ok(saved)
    }

    /// 更新宾客出席状态（本人、主办人或管理员）
    pub async fn update_guest_status(
        &self,
        id: Uuid,
        requester: &User,
        target_user_id: Option<Uuid>,
        new_status: AttendanceStatus,
    ) -> ApplicationResult<()> {
        let mut party = self.find_party(id).await?;
        let effective_user_id = target_user_id.unwrap_or(requester.id);

        let is_self = requester.id == effective_user_id;
        let is_host = party.host_id == requester.id;
        if !is_self && !is_host && !requester.role.manages_any_party() {
            return Err(ApplicationError::Unauthorized(
                "你没有权限修改该宾客的出席状态".to_string(),
            ));
        }

        let now = self.clock.now();
        let old_status = party.set_attendance(effective_user_id, new_status, now)?;
        let name = party.name.clone();
        self.party_repository.update(party).await?;

        self.append_log(
            requester,
            format!(
                "{} changed attendance from {} to {} for party: {}",
                requester.username, old_status, new_status, name
            ),
            LogType::GuestStatusChanged,
        )
        .await?;
        Ok(())
    }

    /// 添加宾客（主办人或管理员）
    pub async fn add_guest(
        &self,
        id: Uuid,
        requester: &User,
        guest_user_id: Uuid,
    ) -> ApplicationResult<()> {
        let mut party = self.find_party(id).await?;
        self.ensure_can_manage(&party, requester, "添加宾客")?;

        let guest = self
            .user_repository
            .find_by_id(guest_user_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("宾客用户不存在: {}", guest_user_id))
            })?;

        let now = self.clock.now();
        party.add_guest(guest_user_id, now)?;
        let saved = self.party_repository.update(party).await?;

        self.append_log(
            requester,
            format!(
                "{} added guest {} to party: {}",
                requester.username, guest.username, saved.name
            ),
            LogType::GuestAdded,
        )
        .await?;

        self.notifier
            .send_party_invitation(&saved, &[guest_user_id])
            .await?;
        Ok(())
    }

    /// 移除宾客（主办人或管理员）
    pub async fn remove_guest(
        &self,
        id: Uuid,
        requester: &User,
        guest_user_id: Uuid,
    ) -> ApplicationResult<()> {
        let mut party = self.find_party(id).await?;
        self.ensure_can_manage(&party, requester, "移除宾客")?;

        let guest = self
            .user_repository
            .find_by_id(guest_user_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("宾客用户不存在: {}", guest_user_id))
            })?;

        party.remove_guest(guest_user_id)?;
        let saved = self.party_repository.update(party).await?;

        self.append_log(
            requester,
            format!(
                "{} removed guest {} from party: {}",
                requester.username, guest.username, saved.name
            ),
            LogType::GuestRemoved,
        )
        .await?;
        Ok(())
    }

    /// 活动改期
    ///
    /// 与创建同样的校验；冲突检查排除活动自身；
    /// 改期会重置阈值重新落在未来的提醒标志。
    pub async fn reschedule(
        &self,
        id: Uuid,
        requester: &User,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> ApplicationResult<Party> {
        let mut party = self.find_party(id).await?;
        self.ensure_can_manage(&party, requester, "修改活动排期")?;

        let now = self.clock.now();
        let new_schedule = TimeRange::new(new_start, new_end)?;
        Party::validate_schedule(&new_schedule, now)?;

        let old_start = party.schedule.start;
        let saved = {
            let _guard = self.scheduling_lock.lock().await;
            let conflicts = self
                .party_repository
                .find_conflicting(&party.rooms, &new_schedule, Some(party.id))
                .await?;
            if !conflicts.is_empty() {
                return Err(PartyError::ScheduleConflict {
                    conflicts: conflicts.len(),
                }
                .into());
            }
            party.reschedule(new_schedule, now)?;
            self.party_repository.update(party).await?
        };

        self.append_log(
            requester,
            format!(
                "{} changed party schedule for: {}",
                requester.username, saved.name
            ),
            LogType::PartyScheduleChanged,
        )
        .await?;

        self.notifier
            .send_party_rescheduled(&saved, old_start)
            .await?;
        Ok(saved)
    }

    /// 删除活动（主办人或管理员；宾客条目随记录一并删除）
    pub async fn delete_party(&self, id: Uuid, requester: &User) -> ApplicationResult<()> {
        let party = self.find_party(id).await?;

        let is_host = party.host_id == requester.id;
        if !is_host && !requester.role.manages_any_party() {
            return Err(ApplicationError::Unauthorized(
                "只有主办人或管理员可以删除活动".to_string(),
            ));
        }

        self.party_repository.delete(id).await?;

        let log_message = if is_host {
            format!(
                "User {} deleted their party: {}",
                requester.username, party.name
            )
        } else {
            format!(
                "Admin {} deleted party: {} hosted by another user",
                requester.username, party.name
            )
        };
        self.append_log(requester, log_message, LogType::PartyDeleted)
            .await?;

        info!("活动已删除: {} ({})", party.name, party.id);
        Ok(())
    }

    /// 应用自动状态推导，发生变化时持久化
    async fn refresh_and_persist(
        &self,
        party: &mut Party,
        now: DateTime<Utc>,
    ) -> ApplicationResult<()> {
        if party.refresh_status(now) {
            self.party_repository.update(party.clone()).await?;
        }
        Ok(())
    }

    fn is_visible_to(party: &Party, viewer: &User, now: DateTime<Utc>) -> bool {
        if viewer.role.sees_all_parties() {
            return true;
        }
        // 非管理员只看未结束的活动
        if party.schedule.end <= now {
            return false;
        }
        if viewer.role.sees_future_parties() {
            return true;
        }
        // 访客只看自己受邀的活动
        party.involves(viewer.id)
    }

    /// 主办人或管理员；静音的主办人被拒绝
    fn ensure_can_manage(
        &self,
        party: &Party,
        requester: &User,
        action: &str,
    ) -> Result<(), ApplicationError> {
        let is_host = party.host_id == requester.id;
        if !is_host && !requester.role.manages_any_party() {
            return Err(PartyError::InsufficientPermissions(format!(
                "只有主办人或管理员可以{}",
                action
            ))
            .into());
        }
        if is_host && requester.muted && !requester.role.can_override_mute() {
            return Err(PartyError::MutedUser(format!("静音用户不能{}", action)).into());
        }
        Ok(())
    }

    async fn find_party(&self, id: Uuid) -> ApplicationResult<Party> {
        self.party_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| PartyError::PartyNotFound(id).into())
    }

    async fn append_log(
        &self,
        actor: &User,
        message: String,
        log_type: LogType,
    ) -> ApplicationResult<()> {
        let entry = LogEntry::new(actor.id, message, log_type, self.clock.now())?;
        self.log_repository.append(entry).await?;
        Ok(())
    }
}
