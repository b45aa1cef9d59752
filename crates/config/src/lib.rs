//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 门硬件握手参数
//! - 提醒轮询周期
//! - 路线估算服务
//! - Redis 硬件通道

use serde::{Deserialize, Serialize};
use std::env;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 门硬件配置
    pub door: DoorConfig,
    /// 提醒轮询配置
    pub reminder: ReminderConfig,
    /// 路线估算配置
    pub routing: RoutingConfig,
    /// Redis配置
    pub redis: RedisConfig,
}

/// 门硬件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// 等待硬件应答的时间上限（秒）
    pub ack_timeout_secs: u64,
    /// 联动开内门的步行时间阈值（秒，合理区间 60–120）
    pub inner_threshold_secs: f64,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: 5,
            inner_threshold_secs: 90.0,
        }
    }
}

/// 提醒轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// 轮询周期（秒）
    pub tick_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
        }
    }
}

/// 路线估算配置（OSRM）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// OSRM 服务地址
    pub osrm_base_url: String,
    /// 目的地（房子）纬度
    pub destination_lat: f64,
    /// 目的地（房子）经度
    pub destination_lng: f64,
}

/// Redis配置（缺省时使用进程内硬件通道）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

impl AppConfig {
    /// 从环境变量加载配置
    /// 对于关键配置（OSRM_BASE_URL、目的地坐标），如果环境变量不存在将会 panic，
    /// 避免生产环境落回不安全的默认值
    pub fn from_env() -> Self {
        Self {
            door: DoorConfig {
                ack_timeout_secs: env_parsed("DOOR_ACK_TIMEOUT_SECS", 5),
                inner_threshold_secs: env_parsed("DOOR_INNER_THRESHOLD_SECS", 90.0),
            },
            reminder: ReminderConfig {
                tick_interval_secs: env_parsed("REMINDER_TICK_INTERVAL_SECS", 60),
            },
            routing: RoutingConfig {
                osrm_base_url: env::var("OSRM_BASE_URL")
                    .expect("OSRM_BASE_URL environment variable is required"),
                destination_lat: env::var("ROUTING_DESTINATION_LAT")
                    .expect("ROUTING_DESTINATION_LAT environment variable is required")
                    .parse()
                    .expect("ROUTING_DESTINATION_LAT must be a number"),
                destination_lng: env::var("ROUTING_DESTINATION_LNG")
                    .expect("ROUTING_DESTINATION_LNG environment variable is required")
                    .parse()
                    .expect("ROUTING_DESTINATION_LNG must be a number"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok(),
            },
        }
    }

    /// 从环境变量加载配置，开发环境版本
    /// 提供默认值，仅用于测试和开发
    pub fn from_env_with_defaults() -> Self {
        Self {
            door: DoorConfig {
                ack_timeout_secs: env_parsed("DOOR_ACK_TIMEOUT_SECS", 5),
                inner_threshold_secs: env_parsed("DOOR_INNER_THRESHOLD_SECS", 90.0),
            },
            reminder: ReminderConfig {
                tick_interval_secs: env_parsed("REMINDER_TICK_INTERVAL_SECS", 60),
            },
            routing: RoutingConfig {
                osrm_base_url: env::var("OSRM_BASE_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
                destination_lat: env_parsed("ROUTING_DESTINATION_LAT", 38.736946),
                destination_lng: env_parsed("ROUTING_DESTINATION_LNG", -9.142685),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok(),
            },
        }
    }
}

/// 解析环境变量，解析失败或缺失时使用默认值
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
