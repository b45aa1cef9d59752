//! 基础设施层实现
//!
//! 对接外部世界的适配器：Redis Pub/Sub 门硬件通道、
//! OSRM 路线估算客户端。

pub mod redis;
pub mod routing;

pub use crate::redis::RedisDoorChannel;
pub use routing::OsrmRoutingOracle;
