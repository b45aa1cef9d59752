//! 活动（Party）实体定义
//!
//! 活动占用一组物理房间的时间窗口，携带宾客名单、生命周期状态
//! 以及五个一次性提醒标志。状态推导与冲突判定都是纯函数，
//! 由服务层决定何时持久化。

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Room, TimeRange};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 活动名称长度上限
const MAX_NAME_LEN: usize = 100;
/// 活动描述长度上限
const MAX_DESCRIPTION_LEN: usize = 500;

/// 活动生命周期状态
///
/// `Cancelled` 与 `Completed` 为吸收态：一旦写入，自动推导不再改变它。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl PartyStatus {
    /// 是否为吸收态（终态）
    pub fn is_terminal(&self) -> bool {
        matches!(self, PartyStatus::Cancelled | PartyStatus::Completed)
    }
}

impl fmt::Display for PartyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyStatus::Scheduled => write!(f, "scheduled"),
            PartyStatus::InProgress => write!(f, "in_progress"),
            PartyStatus::Completed => write!(f, "completed"),
            PartyStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 活动类别
///
/// `Cleaning` 是强制类别：只改变通知措辞，不影响门禁逻辑。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyCategory {
    HouseParty,
    KnowledgeSharing,
    GameNight,
    MovieNight,
    Dinner,
    Cleaning,
}

impl PartyCategory {
    /// 是否为强制参加的类别
    pub fn is_mandatory(&self) -> bool {
        matches!(self, PartyCategory::Cleaning)
    }
}

impl fmt::Display for PartyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyCategory::HouseParty => write!(f, "house_party"),
            PartyCategory::KnowledgeSharing => write!(f, "knowledge_sharing"),
            PartyCategory::GameNight => write!(f, "game_night"),
            PartyCategory::MovieNight => write!(f, "movie_night"),
            PartyCategory::Dinner => write!(f, "dinner"),
            PartyCategory::Cleaning => write!(f, "cleaning"),
        }
    }
}

/// 宾客出席状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Going,
    NotGoing,
    Undecided,
    Late,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Going => write!(f, "going"),
            AttendanceStatus::NotGoing => write!(f, "not_going"),
            AttendanceStatus::Undecided => write!(f, "undecided"),
            AttendanceStatus::Late => write!(f, "late"),
        }
    }
}

/// 宾客条目（用户与其出席状态）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestEntry {
    pub user_id: Uuid,
    pub attendance: AttendanceStatus,
    pub updated_at: DateTime<Utc>,
}

impl GuestEntry {
    /// 新邀请的宾客从未定开始
    pub fn invited(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            attendance: AttendanceStatus::Undecided,
            updated_at: now,
        }
    }
}

/// 提醒里程碑：相对活动开始/结束的五个固定时间点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderMilestone {
    ThreeDay,
    OneDay,
    OneHour,
    Started,
    Ended,
}

impl ReminderMilestone {
    /// 全部里程碑，按固定求值顺序排列
    pub fn all() -> [ReminderMilestone; 5] {
        [
            ReminderMilestone::ThreeDay,
            ReminderMilestone::OneDay,
            ReminderMilestone::OneHour,
            ReminderMilestone::Started,
            ReminderMilestone::Ended,
        ]
    }
}

impl fmt::Display for ReminderMilestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderMilestone::ThreeDay => write!(f, "three_day"),
            ReminderMilestone::OneDay => write!(f, "one_day"),
            ReminderMilestone::OneHour => write!(f, "one_hour"),
            ReminderMilestone::Started => write!(f, "started"),
            ReminderMilestone::Ended => write!(f, "ended"),
        }
    }
}

/// 五个一次性提醒标志
///
/// 每个标志独立持久化，是对应里程碑"至多发送一次"的幂等保障。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReminderFlags {
    pub three_day: bool,
    pub one_day: bool,
    pub one_hour: bool,
    pub started: bool,
    pub ended: bool,
}

impl ReminderFlags {
    /// 对应里程碑是否已发送
    pub fn is_sent(&self, milestone: ReminderMilestone) -> bool {
        match milestone {
            ReminderMilestone::ThreeDay => self.three_day,
            ReminderMilestone::OneDay => self.one_day,
            ReminderMilestone::OneHour => self.one_hour,
            ReminderMilestone::Started => self.started,
            ReminderMilestone::Ended => self.ended,
        }
    }

    /// 置位对应里程碑
    pub fn mark_sent(&mut self, milestone: ReminderMilestone) {
        match milestone {
            ReminderMilestone::ThreeDay => self.three_day = true,
            ReminderMilestone::OneDay => self.one_day = true,
            ReminderMilestone::OneHour => self.one_hour = true,
            ReminderMilestone::Started => self.started = true,
            ReminderMilestone::Ended => self.ended = true,
        }
    }

    /// 改期后重置标志：仅清除阈值重新落在未来的标志。
    /// 阈值仍在过去的标志保持已置位，避免改期后补发过期提醒。
    pub fn reset_for(&mut self, schedule: &TimeRange, now: DateTime<Utc>) {
        if schedule.start > now + Duration::days(3) {
            self.three_day = false;
        }
        if schedule.start > now + Duration::hours(24) {
            self.one_day = false;
        }
        if schedule.start > now + Duration::hours(1) {
            self.one_hour = false;
        }
        if schedule.start > now {
            self.started = false;
        }
        if schedule.end > now {
            self.ended = false;
        }
    }
}

/// 活动实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// 活动唯一ID
    pub id: Uuid,
    /// 主办人（始终视作参与者）
    pub host_id: Uuid,
    /// 活动名称
    pub name: String,
    /// 活动描述（可选）
    pub description: Option<String>,
    /// 占用的房间集合（非空）
    pub rooms: Vec<Room>,
    /// 活动时间窗口 `[start, end)`
    pub schedule: TimeRange,
    /// 当前状态
    pub status: PartyStatus,
    /// 类别
    pub category: PartyCategory,
    /// 宾客名单
    pub guests: Vec<GuestEntry>,
    /// 提醒标志
    pub reminders: ReminderFlags,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Party {
    /// 创建新活动
    ///
    /// 校验：名称非空、房间非空、开始时间不在过去、时长在边界内。
    /// 新活动总是以 `Scheduled` 状态开始。
    pub fn new(
        host_id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
        rooms: Vec<Room>,
        schedule: TimeRange,
        category: PartyCategory,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Self::validate_description(description.as_deref())?;
        Self::validate_rooms(&rooms)?;
        Self::validate_schedule(&schedule, now)?;

        Ok(Self {
            id: Uuid::new_v4(),
            host_id,
            name,
            description,
            rooms,
            schedule,
            status: PartyStatus::Scheduled,
            category,
            guests: Vec::new(),
            reminders: ReminderFlags::default(),
            created_at: now,
        })
    }

    /// 由时间推导当前状态（纯函数）
    ///
    /// 终态吸收；否则按时间窗口映射到
    /// `Scheduled` / `InProgress` / `Completed`。
    pub fn derived_status(&self, now: DateTime<Utc>) -> PartyStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        if now >= self.schedule.end {
            PartyStatus::Completed
        } else if self.schedule.contains(now) {
            PartyStatus::InProgress
        } else {
            PartyStatus::Scheduled
        }
    }

    /// 应用自动状态推导，返回是否发生变化（变化时调用方负责持久化）
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let derived = self.derived_status(now);
        if derived != self.status {
            self.status = derived;
            true
        } else {
            false
        }
    }

    /// 冲突判定：与给定房间集合共享至少一个房间且时间重叠。
    /// 已取消的活动由查询方过滤，不参与冲突。
    pub fn occupies(&self, rooms: &[Room], range: &TimeRange) -> bool {
        self.status != PartyStatus::Cancelled
            && self.rooms.iter().any(|r| rooms.contains(r))
            && self.schedule.overlaps(range)
    }

    /// 用户是否在宾客名单中
    pub fn is_guest(&self, user_id: Uuid) -> bool {
        self.guests.iter().any(|g| g.user_id == user_id)
    }

    /// 用户是否参与活动（主办人或宾客）
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.host_id == user_id || self.is_guest(user_id)
    }

    /// 添加宾客（主办人不可作为宾客，重复邀请被拒绝）
    pub fn add_guest(&mut self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        if user_id == self.host_id {
            return Err(DomainError::business_rule_violation(
                "主办人天然属于活动，无需邀请",
            ));
        }
        if self.is_guest(user_id) {
            return Err(DomainError::business_rule_violation("该用户已在宾客名单中"));
        }
        self.guests.push(GuestEntry::invited(user_id, now));
        Ok(())
    }

    /// 移除宾客
    pub fn remove_guest(&mut self, user_id: Uuid) -> DomainResult<()> {
        if user_id == self.host_id {
            return Err(DomainError::business_rule_violation("不能把主办人移出活动"));
        }
        let before = self.guests.len();
        self.guests.retain(|g| g.user_id != user_id);
        if self.guests.len() == before {
            return Err(DomainError::business_rule_violation("该用户不在宾客名单中"));
        }
        Ok(())
    }

    /// 更新宾客出席状态，返回旧状态
    pub fn set_attendance(
        &mut self,
        user_id: Uuid,
        attendance: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<AttendanceStatus> {
        let entry = self
            .guests
            .iter_mut()
            .find(|g| g.user_id == user_id)
            .ok_or_else(|| DomainError::business_rule_violation("该用户不在宾客名单中"))?;
        let previous = entry.attendance;
        entry.attendance = attendance;
        entry.updated_at = now;
        Ok(previous)
    }

    /// 提醒接收者：主办人 + 出席状态不为 NotGoing 的宾客，去重
    pub fn reminder_recipients(&self) -> Vec<Uuid> {
        let mut recipients = vec![self.host_id];
        for guest in &self.guests {
            if guest.attendance != AttendanceStatus::NotGoing && !recipients.contains(&guest.user_id)
            {
                recipients.push(guest.user_id);
            }
        }
        recipients
    }

    /// 活动相关通知的受众：主办人 + 全部宾客，去重
    pub fn participant_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.host_id];
        for guest in &self.guests {
            if !ids.contains(&guest.user_id) {
                ids.push(guest.user_id);
            }
        }
        ids
    }

    /// 改期：校验新窗口并重置相应提醒标志
    pub fn reschedule(&mut self, schedule: TimeRange, now: DateTime<Utc>) -> DomainResult<()> {
        Self::validate_schedule(&schedule, now)?;
        self.schedule = schedule;
        self.reminders.reset_for(&schedule, now);
        Ok(())
    }

    fn validate_name(name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::validation_error("name", "活动名称不能为空"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DomainError::validation_error(
                "name",
                format!("活动名称不能超过{}个字符", MAX_NAME_LEN),
            ));
        }
        Ok(())
    }

    fn validate_description(description: Option<&str>) -> DomainResult<()> {
        if let Some(text) = description {
            if text.len() > MAX_DESCRIPTION_LEN {
                return Err(DomainError::validation_error(
                    "description",
                    format!("活动描述不能超过{}个字符", MAX_DESCRIPTION_LEN),
                ));
            }
        }
        Ok(())
    }

    fn validate_rooms(rooms: &[Room]) -> DomainResult<()> {
        if rooms.is_empty() {
            return Err(DomainError::validation_error(
                "rooms",
                "活动至少要占用一个房间",
            ));
        }
        Ok(())
    }

    /// 校验活动时间窗口（开始不在过去、时长在边界内）
    pub fn validate_schedule(schedule: &TimeRange, now: DateTime<Utc>) -> DomainResult<()> {
        if schedule.start < now {
            return Err(DomainError::validation_error(
                "schedule",
                "活动开始时间不能在过去",
            ));
        }
        schedule.validate_party_duration()
    }
}
