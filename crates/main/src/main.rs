//! 主应用程序入口
//!
//! 装配存储、时钟与门硬件通道，启动常驻任务：
//! 活动提醒轮询与门铃设备在线监测。

use application::{
    Clock, DeviceMonitor, DoorChannel, HouseState, InMemoryNotificationRepository,
    InMemoryPartyRepository, InMemoryUserRepository, LocalDoorChannel, NotificationService,
    NotificationServiceDependencies, ReminderService, ReminderServiceDependencies, SystemClock,
};
use config::AppConfig;
use infrastructure::RedisDoorChannel;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    // 存储与全局状态
    let party_repository = Arc::new(InMemoryPartyRepository::new());
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let notification_repository = Arc::new(InMemoryNotificationRepository::new());
    let house_state = Arc::new(HouseState::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 门硬件通道：有 REDIS_URL 用 Redis，否则用进程内通道
    let channel: Arc<dyn DoorChannel> = match &config.redis.url {
        Some(url) => {
            tracing::info!("使用 Redis 门硬件通道");
            Arc::new(
                RedisDoorChannel::connect(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("连接 Redis 失败: {}", e))?,
            )
        }
        None => {
            tracing::warn!("未配置 REDIS_URL，使用进程内门硬件通道");
            Arc::new(LocalDoorChannel::new())
        }
    };

    let notifier = Arc::new(NotificationService::new(NotificationServiceDependencies {
        notification_repository,
        user_repository: user_repository.clone(),
        house_state,
        clock: clock.clone(),
    }));

    // 常驻任务：提醒轮询
    let reminder_service = Arc::new(ReminderService::new(
        ReminderServiceDependencies {
            party_repository,
            user_repository,
            notifier,
            clock: clock.clone(),
        },
        config.reminder.clone(),
    ));
    tokio::spawn(reminder_service.run());

    // 常驻任务：门铃设备在线监测
    let monitor = DeviceMonitor::spawn(channel.as_ref(), clock);
    tokio::spawn({
        let monitor = Arc::clone(&monitor);
        async move {
            let mut was_online = false;
            loop {
                tokio::time::sleep(Duration::from_secs(15)).await;
                let online = monitor.is_device_online();
                if online != was_online {
                    if online {
                        tracing::info!("门铃设备上线");
                    } else {
                        tracing::warn!("门铃设备离线");
                    }
                    was_online = online;
                }
            }
        }
    });

    tracing::info!("homegate 已启动");
    tokio::signal::ctrl_c().await?;
    tracing::info!("收到退出信号，正在关闭");

    Ok(())
}
