//! 门铃设备在线监测
//!
//! 固件定期在心跳主题上发消息；超过超时时间没有心跳
//! 就认为设备离线。

use crate::clock::Clock;
use crate::hardware::{topics, DoorChannel};
use chrono::Duration as ChronoDuration;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 心跳超时（秒）
const HEARTBEAT_TIMEOUT_SECS: i64 = 15;

/// 设备在线监测
pub struct DeviceMonitor {
    clock: Arc<dyn Clock>,
    /// 最近一次心跳的时间戳（epoch 毫秒；0 表示从未收到）
    last_heartbeat_ms: AtomicI64,
}

impl DeviceMonitor {
    /// 启动监测：订阅心跳主题，后台任务持续刷新时间戳
    pub fn spawn(channel: &dyn DoorChannel, clock: Arc<dyn Clock>) -> Arc<Self> {
        let monitor = Arc::new(Self {
            clock,
            last_heartbeat_ms: AtomicI64::new(0),
        });

        let mut receiver = channel.subscribe();
        let pump = Arc::clone(&monitor);
        tokio::spawn(async move {
            while let Ok(message) = receiver.recv().await {
                if message.topic == topics::HEARTBEAT {
                    debug!("收到门铃心跳: {}", message.payload);
                    pump.last_heartbeat_ms
                        .store(pump.clock.now().timestamp_millis(), Ordering::SeqCst);
                }
            }
        });

        monitor
    }

    /// 设备是否在线（最近一次心跳在超时窗口内）
    pub fn is_device_online(&self) -> bool {
        let last = self.last_heartbeat_ms.load(Ordering::SeqCst);
        if last == 0 {
            return false;
        }
        let elapsed = self.clock.now().timestamp_millis() - last;
        elapsed <= ChronoDuration::seconds(HEARTBEAT_TIMEOUT_SECS).num_milliseconds()
    }
}
