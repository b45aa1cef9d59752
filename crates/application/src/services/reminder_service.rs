//! 活动提醒服务
//!
//! 固定周期轮询所有未取消的活动，按固定顺序评估五个里程碑，
//! 每个里程碑对一个排期至多发送一次（持久化标志做幂等保障）。
//! 错过发送窗口的里程碑直接置位但不发送，避免事后补发刷屏。
//! 顺带承担每日例行检查：清扫频率与生日问候。

use crate::clock::Clock;
use crate::errors::ApplicationResult;
use crate::repository::{PartyRepository, UserRepository};
use crate::services::notification_service::NotificationService;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use config::ReminderConfig;
use domain::{Party, PartyCategory, PartyStatus, ReminderMilestone};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// 提醒服务依赖
pub struct ReminderServiceDependencies {
    pub party_repository: Arc<dyn PartyRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub notifier: Arc<NotificationService>,
    pub clock: Arc<dyn Clock>,
}

/// 提醒服务
pub struct ReminderService {
    party_repository: Arc<dyn PartyRepository>,
    user_repository: Arc<dyn UserRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    /// 每日检查的最后执行日期，跨天时触发一次
    last_daily_run: Mutex<Option<NaiveDate>>,
}

impl ReminderService {
    pub fn new(deps: ReminderServiceDependencies, config: ReminderConfig) -> Self {
        Self {
            party_repository: deps.party_repository,
            user_repository: deps.user_repository,
            notifier: deps.notifier,
            clock: deps.clock,
            tick_interval: Duration::from_secs(config.tick_interval_secs),
            last_daily_run: Mutex::new(None),
        }
    }

    /// 轮询主循环
    ///
    /// 循环体逐次 await，天然单飞：上一轮没结束不会开始下一轮，
    /// 同一活动的标志不会被并发的轮次竞争。
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("提醒轮询已启动，周期 {:?}", self.tick_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                error!("提醒轮询失败: {}", e);
            }
        }
    }

    /// 单次轮询
    pub async fn tick(&self) -> ApplicationResult<()> {
        let now = self.clock.now();

        for mut party in self.party_repository.find_all().await? {
            // 已取消的活动不再提醒
            if party.status == PartyStatus::Cancelled {
                continue;
            }

            let mut dirty = party.refresh_status(now);
            dirty |= self.evaluate_milestones(&mut party, now).await?;

            if dirty {
                self.party_repository.update(party).await?;
            }
        }

        self.maybe_run_daily_checks(now).await?;
        Ok(())
    }

    /// 按固定顺序评估五个里程碑，返回是否有标志被置位
    async fn evaluate_milestones(
        &self,
        party: &mut Party,
        now: DateTime<Utc>,
    ) -> ApplicationResult<bool> {
        let snapshot = party.clone();
        let start = snapshot.schedule.start;
        let end = snapshot.schedule.end;
        let recipients = snapshot.reminder_recipients();
        let mut dirty = false;

        for milestone in ReminderMilestone::all() {
            if party.reminders.is_sent(milestone) {
                continue;
            }

            // (已达阈值, 发送窗口仍然有效)
            let (due, window_open) = match milestone {
                ReminderMilestone::ThreeDay => (
                    now >= start - ChronoDuration::days(3),
                    start - now > ChronoDuration::hours(24),
                ),
                ReminderMilestone::OneDay => (
                    now >= start - ChronoDuration::hours(24),
                    start - now > ChronoDuration::hours(1),
                ),
                ReminderMilestone::OneHour => {
                    (now >= start - ChronoDuration::hours(1), now < start)
                }
                ReminderMilestone::Started => (now >= start, true),
                ReminderMilestone::Ended => (now >= end, true),
            };

            if !due {
                continue;
            }

            if window_open {
                self.notifier
                    .send_party_reminder(&snapshot, milestone, &recipients)
                    .await?;
            } else {
                // 窗口已过：置位但不发送
                debug!(
                    "活动 {} 的 {} 提醒窗口已过，置位不发送",
                    party.name, milestone
                );
            }
            party.reminders.mark_sent(milestone);
            dirty = true;
        }

        Ok(dirty)
    }

    /// 跨天时执行每日检查
    async fn maybe_run_daily_checks(&self, now: DateTime<Utc>) -> ApplicationResult<()> {
        let today = now.date_naive();
        {
            let mut last = self.last_daily_run.lock().await;
            if *last == Some(today) {
                return Ok(());
            }
            *last = Some(today);
        }
        self.run_daily_checks(now).await
    }

    /// 每日检查：清扫频率与生日问候
    pub async fn run_daily_checks(&self, now: DateTime<Utc>) -> ApplicationResult<()> {
        self.check_cleaning_frequency(now).await?;
        self.check_birthdays(now).await?;
        Ok(())
    }

    /// 两周内没有清扫活动、未来也没有排期时发出逾期警告
    async fn check_cleaning_frequency(&self, now: DateTime<Utc>) -> ApplicationResult<()> {
        let two_weeks_ago = now - ChronoDuration::weeks(2);
        let has_cleaning = self
            .party_repository
            .find_all()
            .await?
            .iter()
            .any(|p| {
                p.category == PartyCategory::Cleaning
                    && p.status != PartyStatus::Cancelled
                    && p.schedule.start > two_weeks_ago
            });

        if !has_cleaning {
            info!("两周内没有清扫活动，发送逾期警告");
            self.notifier.send_cleaning_overdue().await?;
        }
        Ok(())
    }

    /// 给今天过生日的用户发问候
    async fn check_birthdays(&self, now: DateTime<Utc>) -> ApplicationResult<()> {
        let today = now.date_naive();
        for user in self.user_repository.find_all().await? {
            if user.has_birthday_on(today) {
                self.notifier.send_birthday(&user).await?;
            }
        }
        Ok(())
    }
}
