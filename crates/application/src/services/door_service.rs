//! 门禁服务
//!
//! 两部分组成：`AccessGate` 按固定顺序做出放行/拒绝判定
//! （限流 → 静音 → 维护模式 → 活动成员资格），`DoorService`
//! 在放行后驱动外门/内门的硬件握手。硬件是唯一的共享资源，
//! 同一时刻只允许一次开门流程在途。

use crate::clock::Clock;
use crate::errors::{ApplicationResult, DoorError};
use crate::hardware::{
    topics, ChannelError, ChannelMessage, DoorChannel, DoorStage, HardwareSignal, OPEN_COMMAND,
};
use crate::house_state::HouseState;
use crate::repository::{LogRepository, PartyRepository};
use crate::routing::{GeoPoint, RoutingOracle};
use crate::services::notification_service::NotificationService;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use config::DoorConfig;
use domain::{LogEntry, LogType, PartyStatus, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// 限流窗口（秒）
const RATE_LIMIT_WINDOW_SECS: i64 = 10;
/// 窗口内允许的成功开门次数
const RATE_LIMIT_MAX_OPENS: u64 = 2;

/// 单个门的握手结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    Success,
    Failure,
    Timeout,
}

/// 一次开门尝试的最终结果
///
/// `inner` 为 `None` 表示没有尝试内门（无权限、无坐标或路程条件不满足）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorActuationOutcome {
    pub outer: StageOutcome,
    pub inner: Option<StageOutcome>,
}

/// 门禁判定
///
/// 检查按固定顺序短路：限流 → 静音 → 维护模式 → 成员资格。
/// 成员资格检查前会先应用活动的自动状态推导并持久化变化，
/// 判定永远基于派生状态而非过期的存储值。
pub struct AccessGate {
    party_repository: Arc<dyn PartyRepository>,
    log_repository: Arc<dyn LogRepository>,
    house_state: Arc<HouseState>,
}

impl AccessGate {
    pub fn new(
        party_repository: Arc<dyn PartyRepository>,
        log_repository: Arc<dyn LogRepository>,
        house_state: Arc<HouseState>,
    ) -> Self {
        Self {
            party_repository,
            log_repository,
            house_state,
        }
    }

    /// 判定用户当前能否开门
    pub async fn decide(&self, user: &User, now: DateTime<Utc>) -> Result<(), DoorError> {
        // 限流：10 秒内已有 2 次成功开门即拒绝
        let window_start = now - ChronoDuration::seconds(RATE_LIMIT_WINDOW_SECS);
        let recent_opens = self
            .log_repository
            .count_since(user.id, LogType::DoorOpen, window_start)
            .await
            .map_err(|e| DoorError::Storage(e.to_string()))?;
        if recent_opens >= RATE_LIMIT_MAX_OPENS {
            return Err(DoorError::RateLimited);
        }

        // 静音
        if user.muted && !user.role.can_override_mute() {
            return Err(DoorError::Muted);
        }

        // 维护模式
        if self.house_state.maintenance_active() && !user.role.bypasses_maintenance() {
            return Err(DoorError::MaintenanceActive);
        }

        // 成员资格：特权与住户角色直接放行，
        // 访客必须参与至少一个派生状态为进行中的活动
        if user.role.bypasses_membership_gate() {
            return Ok(());
        }

        let parties = self
            .party_repository
            .find_by_user(user.id)
            .await
            .map_err(|e| DoorError::Storage(e.to_string()))?;
        for mut party in parties {
            if party.refresh_status(now) {
                self.party_repository
                    .update(party.clone())
                    .await
                    .map_err(|e| DoorError::Storage(e.to_string()))?;
            }
            if party.status == PartyStatus::InProgress {
                return Ok(());
            }
        }

        Err(DoorError::NotInvited)
    }
}

/// 门禁服务依赖
pub struct DoorServiceDependencies {
    pub party_repository: Arc<dyn PartyRepository>,
    pub log_repository: Arc<dyn LogRepository>,
    pub notifier: Arc<NotificationService>,
    pub house_state: Arc<HouseState>,
    pub channel: Arc<dyn DoorChannel>,
    pub routing: Arc<dyn RoutingOracle>,
    pub clock: Arc<dyn Clock>,
    pub config: DoorConfig,
}

/// 门禁服务
pub struct DoorService {
    gate: AccessGate,
    log_repository: Arc<dyn LogRepository>,
    notifier: Arc<NotificationService>,
    channel: Arc<dyn DoorChannel>,
    routing: Arc<dyn RoutingOracle>,
    clock: Arc<dyn Clock>,
    config: DoorConfig,
    /// 单飞锁：物理门是唯一共享资源，并发尝试直接拒绝，
    /// 避免两次开门互相串线对方的应答
    device_lock: Mutex<()>,
}

impl DoorService {
    pub fn new(deps: DoorServiceDependencies) -> Self {
        let gate = AccessGate::new(
            deps.party_repository,
            Arc::clone(&deps.log_repository),
            deps.house_state,
        );
        Self {
            gate,
            log_repository: deps.log_repository,
            notifier: deps.notifier,
            channel: deps.channel,
            routing: deps.routing,
            clock: deps.clock,
            config: deps.config,
            device_lock: Mutex::new(()),
        }
    }

    /// 门禁判定（不触发硬件）
    pub async fn check_access(&self, user: &User) -> Result<(), DoorError> {
        self.gate.decide(user, self.clock.now()).await
    }

    /// 完整的开门流程：判定 → 外门握手 → （可选）内门握手 → 播报
    pub async fn open_door(
        &self,
        user: &User,
        origin: Option<GeoPoint>,
    ) -> Result<DoorActuationOutcome, DoorError> {
        let _guard = self.device_lock.try_lock().map_err(|_| DoorError::Busy)?;

        let now = self.clock.now();
        self.gate.decide(user, now).await?;

        info!("用户 {} 请求开外门", user.username);
        let outer = self.actuate(DoorStage::Outer).await?;
        match outer {
            StageOutcome::Success => {
                self.append_log(
                    user,
                    format!("Outer door opened successfully for user {}", user.username),
                    LogType::DoorOpen,
                )
                .await;
            }
            StageOutcome::Failure => {
                self.append_log(
                    user,
                    format!("Outer door failed to open for user {}", user.username),
                    LogType::DoorOpenFailed,
                )
                .await;
                return Err(DoorError::StageFailed {
                    stage: DoorStage::Outer,
                });
            }
            StageOutcome::Timeout => {
                self.append_log(
                    user,
                    format!(
                        "Outer door acknowledgement timed out for user {}",
                        user.username
                    ),
                    LogType::DoorOpenError,
                )
                .await;
                return Err(DoorError::StageTimedOut {
                    stage: DoorStage::Outer,
                });
            }
        }

        // 内门：需要多重门权限 + 来访者坐标 + 路程低于阈值。
        // 路线估算的任何失败都被吸收，绝不影响已经成功的外门。
        let mut inner = None;
        if user.multi_door {
            if let Some(origin) = origin {
                if self.should_open_inner(origin).await {
                    let outcome = self.actuate(DoorStage::Inner).await?;
                    match outcome {
                        StageOutcome::Success => {
                            self.append_log(
                                user,
                                format!("Inner door opened for user {}", user.username),
                                LogType::DoorOpen,
                            )
                            .await;
                        }
                        StageOutcome::Failure => {
                            self.append_log(
                                user,
                                format!("Inner door failed for user {}", user.username),
                                LogType::DoorOpenFailed,
                            )
                            .await;
                        }
                        StageOutcome::Timeout => {
                            self.append_log(
                                user,
                                format!(
                                    "Inner door acknowledgement timed out for user {}",
                                    user.username
                                ),
                                LogType::DoorOpenError,
                            )
                            .await;
                        }
                    }
                    inner = Some(outcome);
                }
            }
        }

        // 播报失败不影响开门结果
        if let Err(e) = self.notifier.send_door_opened(user).await {
            warn!("开门播报失败: {}", e);
        }

        Ok(DoorActuationOutcome {
            outer: StageOutcome::Success,
            inner,
        })
    }

    /// 路线估算是否满足联动开内门的条件
    async fn should_open_inner(&self, origin: GeoPoint) -> bool {
        match self.routing.estimate_travel_seconds(origin).await {
            Ok(seconds) => {
                debug!("路线估算: {:.0} 秒（阈值 {:.0}）", seconds, self.config.inner_threshold_secs);
                seconds < self.config.inner_threshold_secs
            }
            Err(e) => {
                warn!("路线估算失败，视作不满足条件: {}", e);
                false
            }
        }
    }

    /// 单个门的握手：先订阅应答，再发布指令，限时等待匹配的应答。
    /// 超时后订阅随接收端一起丢弃，迟到的应答不会泄漏进后续尝试。
    async fn actuate(&self, stage: DoorStage) -> Result<StageOutcome, DoorError> {
        let mut receiver = self.channel.subscribe();

        let topic = match stage {
            DoorStage::Outer => topics::OPEN_OUTER,
            DoorStage::Inner => topics::OPEN_INNER,
        };
        self.channel.publish(topic, OPEN_COMMAND).await?;

        let deadline = Duration::from_secs(self.config.ack_timeout_secs);
        match tokio::time::timeout(deadline, Self::await_ack(&mut receiver, stage)).await {
            Ok(Some(true)) => Ok(StageOutcome::Success),
            Ok(Some(false)) => Ok(StageOutcome::Failure),
            Ok(None) => Err(DoorError::Channel(ChannelError::Closed)),
            Err(_) => Ok(StageOutcome::Timeout),
        }
    }

    /// 在状态主题上等待指定门的应答；通道关闭返回 None
    async fn await_ack(
        receiver: &mut broadcast::Receiver<ChannelMessage>,
        stage: DoorStage,
    ) -> Option<bool> {
        loop {
            match receiver.recv().await {
                Ok(message) if message.topic == topics::STATUS => {
                    if let Some(signal) = HardwareSignal::decode(&message.payload) {
                        if signal.stage == stage {
                            return Some(signal.ok);
                        }
                    }
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("硬件通道积压，跳过 {} 条消息", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// 审计日志写入失败只记录，不中断开门流程
    async fn append_log(&self, actor: &User, message: String, log_type: LogType) {
        match LogEntry::new(actor.id, message, log_type, self.clock.now()) {
            Ok(entry) => {
                if let Err(e) = self.log_repository.append(entry).await {
                    warn!("审计日志写入失败: {}", e);
                }
            }
            Err(e) => warn!("审计日志构造失败: {}", e),
        }
    }

    /// 最近的审计日志（门禁面板用）
    pub async fn recent_logs(&self, limit: usize) -> ApplicationResult<Vec<LogEntry>> {
        Ok(self.log_repository.recent(limit).await?)
    }
}
