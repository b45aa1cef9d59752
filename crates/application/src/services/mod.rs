mod device_monitor;
mod door_service;
mod house_service;
mod notification_service;
mod party_service;
mod reminder_service;

mod party_service_tests;

pub use device_monitor::DeviceMonitor;
pub use door_service::{
    AccessGate, DoorActuationOutcome, DoorService, DoorServiceDependencies, StageOutcome,
};
pub use house_service::{HouseService, HouseServiceDependencies};
pub use notification_service::{NotificationService, NotificationServiceDependencies};
pub use party_service::{CreatePartyRequest, PartyService, PartyServiceDependencies};
pub use reminder_service::{ReminderService, ReminderServiceDependencies};
