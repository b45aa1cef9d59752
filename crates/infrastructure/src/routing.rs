//! OSRM 路线估算客户端
//!
//! 调用 OSRM 的 `route/v1/foot` 接口，取第一条路线的时长。
//! 坐标顺序是 OSRM 约定的 `lng,lat`。

use application::{GeoPoint, RoutingError, RoutingOracle};
use async_trait::async_trait;
use config::RoutingConfig;
use tracing::debug;

/// OSRM 路线估算
pub struct OsrmRoutingOracle {
    http: reqwest::Client,
    config: RoutingConfig,
}

impl OsrmRoutingOracle {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RoutingOracle for OsrmRoutingOracle {
    async fn estimate_travel_seconds(&self, origin: GeoPoint) -> Result<f64, RoutingError> {
        let url = format!(
            "{}/route/v1/foot/{},{};{},{}?overview=false",
            self.config.osrm_base_url,
            origin.longitude,
            origin.latitude,
            self.config.destination_lng,
            self.config.destination_lat,
        );
        debug!("请求路线估算: {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RoutingError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RoutingError::Unavailable(format!(
                "OSRM 返回 {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RoutingError::Unavailable(e.to_string()))?;

        body.get("routes")
            .and_then(|routes| routes.get(0))
            .and_then(|route| route.get("duration"))
            .and_then(|duration| duration.as_f64())
            .ok_or(RoutingError::NoRoute)
    }
}
