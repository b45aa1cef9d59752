//! 路线估算接口
//!
//! 外部协作方：给定来访者坐标，估算步行到房子的时间。
//! 任何失败都由调用方吸收，绝不影响开门主流程。

use async_trait::async_trait;
use thiserror::Error;

/// 地理坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// 路线估算错误类型
#[derive(Debug, Error)]
pub enum RoutingError {
    /// 服务不可达或响应异常
    #[error("路线服务不可用: {0}")]
    Unavailable(String),

    /// 响应里没有可用路线
    #[error("无法计算路线")]
    NoRoute,
}

/// 路线估算接口
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    /// 估算从 `origin` 步行到房子的时间（秒）
    async fn estimate_travel_seconds(&self, origin: GeoPoint) -> Result<f64, RoutingError>;
}
