//! 门硬件通道抽象
//!
//! 门固件只通过发布/订阅消息通道可达：命令主题下发开门指令，
//! 状态主题异步回传每个门的应答。生产环境走 Redis Pub/Sub，
//! 测试与单机部署使用进程内广播通道。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;

/// 通道主题
pub mod topics {
    /// 外门开门指令
    pub const OPEN_OUTER: &str = "door/open/outer";
    /// 内门开门指令
    pub const OPEN_INNER: &str = "door/open/inner";
    /// 硬件应答
    pub const STATUS: &str = "door/status";
    /// 门铃设备心跳
    pub const HEARTBEAT: &str = "door/online/status";
}

/// 开门指令载荷
pub const OPEN_COMMAND: &str = "open";

/// 门的阶段（外门/内门）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorStage {
    Outer,
    Inner,
}

impl fmt::Display for DoorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorStage::Outer => write!(f, "外"),
            DoorStage::Inner => write!(f, "内"),
        }
    }
}

/// 硬件应答载荷：哪个门、是否成功
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSignal {
    pub stage: DoorStage,
    pub ok: bool,
}

impl HardwareSignal {
    pub fn encode(&self) -> String {
        // 结构固定，序列化不会失败
        serde_json::to_string(self).unwrap_or_default()
    }

    /// 解析应答载荷，无法识别的消息返回 None（静默忽略）
    pub fn decode(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }
}

/// 通道上的一条消息
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub topic: String,
    pub payload: String,
}

/// 通道错误类型
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("发布失败: {0}")]
    Publish(String),

    #[error("通道已关闭")]
    Closed,
}

/// 门硬件通道接口
#[async_trait]
pub trait DoorChannel: Send + Sync {
    /// 发布一条消息到指定主题
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError>;

    /// 订阅通道上的所有消息（订阅方自行按主题过滤）
    fn subscribe(&self) -> broadcast::Receiver<ChannelMessage>;
}

/// 进程内门硬件通道
#[derive(Clone)]
pub struct LocalDoorChannel {
    sender: broadcast::Sender<ChannelMessage>,
}

impl LocalDoorChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

impl Default for LocalDoorChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DoorChannel for LocalDoorChannel {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError> {
        // Pub/Sub 语义：没有订阅者不算错误
        let _ = self.sender.send(ChannelMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.sender.subscribe()
    }
}
