//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、并发边界、
//! 以及对外部适配器（存储、门硬件通道、路线估算、时钟）的抽象。

pub mod clock;
pub mod errors;
pub mod hardware;
pub mod house_state;
pub mod memory;
pub mod repository;
pub mod routing;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ApplicationError, ApplicationResult, DoorError, PartyError};
pub use hardware::{
    topics, ChannelError, ChannelMessage, DoorChannel, DoorStage, HardwareSignal,
    LocalDoorChannel, OPEN_COMMAND,
};
pub use house_state::HouseState;
pub use memory::{
    InMemoryLogRepository, InMemoryNotificationRepository, InMemoryPartyRepository,
    InMemoryUserRepository,
};
pub use repository::{
    LogRepository, NotificationRepository, PartyRepository, RepositoryError, UserRepository,
};
pub use routing::{GeoPoint, RoutingError, RoutingOracle};
pub use services::{
    AccessGate, CreatePartyRequest, DeviceMonitor, DoorActuationOutcome, DoorService,
    DoorServiceDependencies, HouseService, HouseServiceDependencies, NotificationService,
    NotificationServiceDependencies, PartyService, PartyServiceDependencies, ReminderService,
    ReminderServiceDependencies, StageOutcome,
};
