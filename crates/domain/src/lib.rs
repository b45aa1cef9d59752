//! 门禁与家庭活动系统核心领域模型
//!
//! 包含用户、活动（Party）、通知、审计日志等核心实体，
//! 以及纯函数形式的生命周期推导与房间冲突判定规则。

pub mod entities;
pub mod errors;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
