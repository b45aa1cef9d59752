//! Redis Pub/Sub 门硬件通道
//!
//! 把 `DoorChannel` 抽象落在 Redis 上：发布走连接管理器，
//! 订阅由一个后台任务完成，收到的消息泵入进程内广播通道，
//! 本地订阅者（门禁服务、测试）从广播端接收。

use application::{topics, ChannelError, ChannelMessage, DoorChannel};
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Redis 门硬件通道
pub struct RedisDoorChannel {
    publish_conn: ConnectionManager,
    sender: broadcast::Sender<ChannelMessage>,
}

impl RedisDoorChannel {
    /// 连接 Redis 并启动订阅泵
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let client = Client::open(url)
            .map_err(|e| ChannelError::Publish(format!("创建 Redis 客户端失败: {}", e)))?;

        let publish_conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| ChannelError::Publish(format!("连接 Redis 失败: {}", e)))?;

        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| ChannelError::Publish(format!("创建订阅连接失败: {}", e)))?;
        for topic in [topics::OPEN_OUTER, topics::OPEN_INNER, topics::STATUS] {
            pubsub
                .subscribe(topic)
                .await
                .map_err(|e| ChannelError::Publish(format!("订阅 {} 失败: {}", topic, e)))?;
        }

        let (sender, _) = broadcast::channel(256);
        let pump = sender.clone();
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(message) = stream.next().await {
                let topic = message.get_channel_name().to_string();
                let payload: String = match message.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("解析 Redis 消息失败: {}", e);
                        continue;
                    }
                };
                // 没有本地订阅者不算错误
                let _ = pump.send(ChannelMessage { topic, payload });
            }
            warn!("Redis 订阅流已结束");
        });

        info!("Redis 门硬件通道已连接");
        Ok(Self {
            publish_conn,
            sender,
        })
    }
}

#[async_trait]
impl DoorChannel for RedisDoorChannel {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError> {
        let mut conn = self.publish_conn.clone();
        let _: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| ChannelError::Publish(format!("发布到 {} 失败: {}", topic, e)))?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.sender.subscribe()
    }
}
