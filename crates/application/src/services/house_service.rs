//! 房屋管理服务
//!
//! 维护模式与注册封锁的开关操作，仅限管理员。
//! 每次切换都写审计日志并广播通知。

use crate::clock::Clock;
use crate::errors::{ApplicationError, ApplicationResult};
use crate::house_state::HouseState;
use crate::repository::LogRepository;
use crate::services::notification_service::NotificationService;
use domain::{LogEntry, LogType, User};
use std::sync::Arc;
use tracing::info;

/// 房屋管理服务依赖
pub struct HouseServiceDependencies {
    pub house_state: Arc<HouseState>,
    pub log_repository: Arc<dyn LogRepository>,
    pub notifier: Arc<NotificationService>,
    pub clock: Arc<dyn Clock>,
}

/// 房屋管理服务
pub struct HouseService {
    house_state: Arc<HouseState>,
    log_repository: Arc<dyn LogRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl HouseService {
    pub fn new(deps: HouseServiceDependencies) -> Self {
        Self {
            house_state: deps.house_state,
            log_repository: deps.log_repository,
            notifier: deps.notifier,
            clock: deps.clock,
        }
    }

    /// 开启维护模式（仅管理员）
    pub async fn activate_maintenance(&self, actor: &User) -> ApplicationResult<()> {
        self.ensure_admin(actor, "开启维护模式")?;
        self.house_state.set_maintenance(true);

        self.append_log(
            actor,
            format!("Admin {} activated maintenance mode", actor.username),
        )
        .await?;
        self.notifier.send_maintenance_toggled(true).await?;

        info!("维护模式已开启（操作者 {}）", actor.username);
        Ok(())
    }

    /// 关闭维护模式（仅管理员）
    pub async fn deactivate_maintenance(&self, actor: &User) -> ApplicationResult<()> {
        self.ensure_admin(actor, "关闭维护模式")?;
        self.house_state.set_maintenance(false);

        self.append_log(
            actor,
            format!("Admin {} deactivated maintenance mode", actor.username),
        )
        .await?;
        self.notifier.send_maintenance_toggled(false).await?;

        info!("维护模式已关闭（操作者 {}）", actor.username);
        Ok(())
    }

    /// 封锁新用户注册（仅管理员）
    pub async fn block_registration(&self, actor: &User) -> ApplicationResult<()> {
        self.ensure_admin(actor, "封锁注册")?;
        self.house_state.set_registration_blocked(true);

        self.append_registration_log(
            actor,
            format!("Admin {} blocked new user registrations", actor.username),
        )
        .await?;
        self.notifier.send_registration_toggled(true).await?;
        Ok(())
    }

    /// 解除注册封锁（仅管理员）
    pub async fn unblock_registration(&self, actor: &User) -> ApplicationResult<()> {
        self.ensure_admin(actor, "解除注册封锁")?;
        self.house_state.set_registration_blocked(false);

        self.append_registration_log(
            actor,
            format!("Admin {} unblocked new user registrations", actor.username),
        )
        .await?;
        self.notifier.send_registration_toggled(false).await?;
        Ok(())
    }

    fn ensure_admin(&self, actor: &User, action: &str) -> Result<(), ApplicationError> {
        if !actor.role.manages_house() {
            return Err(ApplicationError::Unauthorized(format!(
                "只有管理员可以{}",
                action
            )));
        }
        Ok(())
    }

    async fn append_log(&self, actor: &User, message: String) -> ApplicationResult<()> {
        let entry = LogEntry::new(actor.id, message, LogType::Maintenance, self.clock.now())?;
        self.log_repository.append(entry).await?;
        Ok(())
    }

    async fn append_registration_log(
        &self,
        actor: &User,
        message: String,
    ) -> ApplicationResult<()> {
        let entry = LogEntry::new(
            actor.id,
            message,
            LogType::RegistrationManagement,
            self.clock.now(),
        )?;
        self.log_repository.append(entry).await?;
        Ok(())
    }
}
