//! 通知服务
//!
//! 把业务事件组装成面向用户的通知文案，并为每个接收者在
//! 仪表盘存储里落一条记录。推送投递由外部系统完成，不在此处。
//! 清扫类活动使用强制口吻的文案变体。

use crate::clock::Clock;
use crate::errors::ApplicationResult;
use crate::house_state::HouseState;
use crate::repository::{NotificationRepository, UserRepository};
use chrono::{DateTime, Utc};
use domain::{
    Notification, NotificationCategory, Party, PartyStatus, ReminderMilestone, User,
};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 通知服务依赖
pub struct NotificationServiceDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub house_state: Arc<HouseState>,
    pub clock: Arc<dyn Clock>,
}

/// 通知服务
pub struct NotificationService {
    notification_repository: Arc<dyn NotificationRepository>,
    user_repository: Arc<dyn UserRepository>,
    house_state: Arc<HouseState>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self {
            notification_repository: deps.notification_repository,
            user_repository: deps.user_repository,
            house_state: deps.house_state,
            clock: deps.clock,
        }
    }

    /// 为每个接收者落一条仪表盘记录
    async fn deliver(
        &self,
        title: &str,
        message: &str,
        recipients: &[Uuid],
        category: NotificationCategory,
        party_id: Option<Uuid>,
    ) -> ApplicationResult<()> {
        if recipients.is_empty() {
            debug!("通知 '{}' 没有接收者，跳过", title);
            return Ok(());
        }

        let now = self.clock.now();
        for user_id in recipients {
            let notification =
                Notification::new(*user_id, title, message, category, party_id, now);
            self.notification_repository.save(notification).await?;
        }

        info!("通知 '{}' 已发送给 {} 个用户", title, recipients.len());
        Ok(())
    }

    /// 活动邀请通知
    pub async fn send_party_invitation(
        &self,
        party: &Party,
        recipients: &[Uuid],
    ) -> ApplicationResult<()> {
        let when = format_datetime(party.schedule.start);
        let (title, message) = if party.category.is_mandatory() {
            (
                "🧹 Mandatory cleaning scheduled".to_string(),
                format!(
                    "Cleaning session '{}' at {}. Your participation is required!",
                    party.name, when
                ),
            )
        } else {
            (
                "You got an invitation!".to_string(),
                format!("Invite to '{}' at {}. Check the details.", party.name, when),
            )
        };

        self.deliver(
            &title,
            &message,
            recipients,
            NotificationCategory::Party,
            Some(party.id),
        )
        .await
    }

    /// 活动状态变更通知（发给主办人与全部宾客）
    pub async fn send_party_status_changed(
        &self,
        party: &Party,
        new_status: PartyStatus,
    ) -> ApplicationResult<()> {
        let mandatory = party.category.is_mandatory();
        let status_text = match new_status {
            PartyStatus::Scheduled => {
                if mandatory {
                    "scheduled - MANDATORY"
                } else {
                    "scheduled"
                }
            }
            PartyStatus::InProgress => {
                if mandatory {
                    "IN PROGRESS - JOIN NOW!"
                } else {
                    "in progress"
                }
            }
            PartyStatus::Completed => {
                if mandatory {
                    "completed - thank you!"
                } else {
                    "completed"
                }
            }
            PartyStatus::Cancelled => {
                if mandatory {
                    "CANCELLED - check updates"
                } else {
                    "cancelled"
                }
            }
        };

        let title = if mandatory {
            "🧹 Cleaning update"
        } else {
            "Party status updated"
        };
        let message = format!("'{}' is now {}.", party.name, status_text);

        self.deliver(
            title,
            &message,
            &party.participant_ids(),
            NotificationCategory::Party,
            Some(party.id),
        )
        .await
    }

    /// 活动改期通知（发给主办人与全部宾客）
    pub async fn send_party_rescheduled(
        &self,
        party: &Party,
        old_start: DateTime<Utc>,
    ) -> ApplicationResult<()> {
        let title = if party.category.is_mandatory() {
            "🧹 Cleaning rescheduled"
        } else {
            "Party rescheduled"
        };
        let message = format!(
            "'{}' moved from {} to {}.",
            party.name,
            format_datetime(old_start),
            format_datetime(party.schedule.start)
        );

        self.deliver(
            title,
            &message,
            &party.participant_ids(),
            NotificationCategory::Party,
            Some(party.id),
        )
        .await
    }

    /// 里程碑提醒通知
    pub async fn send_party_reminder(
        &self,
        party: &Party,
        milestone: ReminderMilestone,
        recipients: &[Uuid],
    ) -> ApplicationResult<()> {
        let date = format_datetime(party.schedule.start);
        let time = party.schedule.start.format("%H:%M").to_string();

        let (title, message) = if party.category.is_mandatory() {
            match milestone {
                ReminderMilestone::ThreeDay => (
                    "🧹 Cleaning reminder - 3 days".to_string(),
                    format!(
                        "Mandatory cleaning session '{}' in 3 days on {}. Plan ahead!",
                        party.name, date
                    ),
                ),
                ReminderMilestone::OneDay => (
                    "🧹 Cleaning tomorrow!".to_string(),
                    format!(
                        "Mandatory cleaning session '{}' tomorrow at {}. Be ready!",
                        party.name, time
                    ),
                ),
                ReminderMilestone::OneHour => (
                    "🧹 Cleaning starts in 1 hour!".to_string(),
                    format!(
                        "Cleaning session '{}' starts in 1 hour. Get the supplies out.",
                        party.name
                    ),
                ),
                ReminderMilestone::Started => (
                    "🧹 Cleaning session started!".to_string(),
                    format!("'{}' has started. Please join immediately.", party.name),
                ),
                ReminderMilestone::Ended => (
                    "🧹 Cleaning session completed".to_string(),
                    format!("'{}' has ended. Thanks for participating!", party.name),
                ),
            }
        } else {
            match milestone {
                ReminderMilestone::ThreeDay => (
                    "Party reminder - 3 days".to_string(),
                    format!("Don't forget! '{}' is in 3 days on {}.", party.name, date),
                ),
                ReminderMilestone::OneDay => (
                    "Party reminder - tomorrow".to_string(),
                    format!("Tomorrow! '{}' is at {}.", party.name, time),
                ),
                ReminderMilestone::OneHour => (
                    "Party starting soon".to_string(),
                    format!("'{}' starts in 1 hour. Time to get ready!", party.name),
                ),
                ReminderMilestone::Started => (
                    "Party started!".to_string(),
                    format!("'{}' has just started. Join the fun!", party.name),
                ),
                ReminderMilestone::Ended => (
                    "Party ended".to_string(),
                    format!("'{}' has ended. Hope you had a great time!", party.name),
                ),
            }
        };

        self.deliver(
            &title,
            &message,
            recipients,
            NotificationCategory::Party,
            Some(party.id),
        )
        .await
    }

    /// 维护模式切换通知（发给所有用户）
    pub async fn send_maintenance_toggled(&self, active: bool) -> ApplicationResult<()> {
        let (title, message) = if active {
            (
                "Maintenance mode activated",
                "The system is now in maintenance mode. Door opening is disabled!",
            )
        } else {
            (
                "Maintenance mode deactivated",
                "Maintenance mode ended. Door opening is enabled again!",
            )
        };

        let recipients = self.all_user_ids().await?;
        self.deliver(title, message, &recipients, NotificationCategory::System, None)
            .await
    }

    /// 注册封锁切换通知（仅发给管理员）
    pub async fn send_registration_toggled(&self, blocked: bool) -> ApplicationResult<()> {
        let (title, message) = if blocked {
            (
                "User registration blocked",
                "New user registrations have been blocked by an admin.",
            )
        } else {
            (
                "User registration unblocked",
                "New user registrations have been unblocked by an admin.",
            )
        };

        let recipients = self.admin_ids().await?;
        self.deliver(title, message, &recipients, NotificationCategory::System, None)
            .await
    }

    /// 开门播报
    ///
    /// 受众：管理员 + 住户，去掉开门者本人；
    /// 维护模式下收窄为仅管理员。
    pub async fn send_door_opened(&self, opener: &User) -> ApplicationResult<()> {
        let maintenance = self.house_state.maintenance_active();
        let recipients: Vec<Uuid> = self
            .user_repository
            .find_all()
            .await?
            .into_iter()
            .filter(|u| u.id != opener.id)
            .filter(|u| {
                if maintenance {
                    u.role.manages_house()
                } else {
                    u.role.in_door_audience()
                }
            })
            .map(|u| u.id)
            .collect();

        let message = format!("The door was opened by {}", opener.username);
        self.deliver(
            "Door opened",
            &message,
            &recipients,
            NotificationCategory::Doorbell,
            None,
        )
        .await
    }

    /// 清扫逾期警告（发给管理员与住户，随机挑选一条措辞）
    pub async fn send_cleaning_overdue(&self) -> ApplicationResult<()> {
        const URGENT: [(&str, &str); 3] = [
            (
                "🧹 CRITICAL: house cleaning overdue!",
                "It's been 2 weeks since the last cleaning session. Schedule a cleaning party immediately!",
            ),
            (
                "🚨 URGENT: 2 weeks without cleaning!",
                "No cleaning has happened for 2 weeks. Organize a mandatory cleaning session now!",
            ),
            (
                "⚠️ Immediate action required: cleaning needed!",
                "2 weeks without proper house cleaning. Hygiene standards are at risk!",
            ),
        ];

        let (title, message) = URGENT[rand::rng().random_range(0..URGENT.len())];
        let recipients: Vec<Uuid> = self
            .user_repository
            .find_all()
            .await?
            .into_iter()
            .filter(|u| u.role.in_door_audience())
            .map(|u| u.id)
            .collect();

        self.deliver(title, message, &recipients, NotificationCategory::System, None)
            .await
    }

    /// 生日问候（发给所有用户）
    pub async fn send_birthday(&self, birthday_user: &User) -> ApplicationResult<()> {
        let message = format!(
            "Congratulations {}! The house wishes you a fantastic day!",
            birthday_user.username
        );
        let recipients = self.all_user_ids().await?;
        self.deliver(
            "🎉 Happy Birthday!",
            &message,
            &recipients,
            NotificationCategory::System,
            None,
        )
        .await
    }

    async fn all_user_ids(&self) -> ApplicationResult<Vec<Uuid>> {
        Ok(self
            .user_repository
            .find_all()
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }

    async fn admin_ids(&self) -> ApplicationResult<Vec<Uuid>> {
        Ok(self
            .user_repository
            .find_all()
            .await?
            .into_iter()
            .filter(|u| u.role.manages_house())
            .map(|u| u.id)
            .collect())
    }
}

fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}
