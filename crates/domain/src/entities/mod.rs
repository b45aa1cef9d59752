//! 实体定义模块

pub mod log;
pub mod notification;
pub mod party;
pub mod user;

pub use log::{LogEntry, LogType};
pub use notification::{Notification, NotificationCategory};
pub use party::{
    AttendanceStatus, GuestEntry, Party, PartyCategory, PartyStatus, ReminderFlags,
    ReminderMilestone,
};
pub use user::{User, UserRole};
