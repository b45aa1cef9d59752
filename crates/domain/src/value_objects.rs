//! 值对象定义
//!
//! 房间枚举与半开时间区间，活动排期的基础构件。

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 活动时长下限（分钟）
pub const MIN_PARTY_MINUTES: i64 = 20;
/// 活动时长上限（小时）
pub const MAX_PARTY_HOURS: i64 = 24;

/// 房间枚举（封闭集合，对应物理房间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Room {
    Kitchen,
    LivingRoom,
    DiningRoom,
    Study,
    Balcony,
    Garage,
    BedroomNorth,
    BedroomSouth,
    BedroomEast,
    BedroomWest,
}

impl Room {
    /// 所有房间
    pub fn all() -> &'static [Room] {
        &[
            Room::Kitchen,
            Room::LivingRoom,
            Room::DiningRoom,
            Room::Study,
            Room::Balcony,
            Room::Garage,
            Room::BedroomNorth,
            Room::BedroomSouth,
            Room::BedroomEast,
            Room::BedroomWest,
        ]
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Kitchen => write!(f, "kitchen"),
            Room::LivingRoom => write!(f, "living_room"),
            Room::DiningRoom => write!(f, "dining_room"),
            Room::Study => write!(f, "study"),
            Room::Balcony => write!(f, "balcony"),
            Room::Garage => write!(f, "garage"),
            Room::BedroomNorth => write!(f, "bedroom_north"),
            Room::BedroomSouth => write!(f, "bedroom_south"),
            Room::BedroomEast => write!(f, "bedroom_east"),
            Room::BedroomWest => write!(f, "bedroom_west"),
        }
    }
}

/// 半开时间区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// 创建时间区间，要求 `end > start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::validation_error(
                "schedule",
                "结束时间必须晚于开始时间",
            ));
        }
        Ok(Self { start, end })
    }

    /// 区间时长
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// 半开区间重叠判定：`a.start < b.end && b.start < a.end`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 时刻是否落在区间内（含 start，不含 end）
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// 校验活动时长边界（最短 20 分钟，最长 24 小时）
    pub fn validate_party_duration(&self) -> DomainResult<()> {
        let duration = self.duration();
        if duration < Duration::minutes(MIN_PARTY_MINUTES) {
            return Err(DomainError::validation_error(
                "schedule",
                format!("活动时长不得少于 {} 分钟", MIN_PARTY_MINUTES),
            ));
        }
        if duration > Duration::hours(MAX_PARTY_HOURS) {
            return Err(DomainError::validation_error(
                "schedule",
                format!("活动时长不得超过 {} 小时", MAX_PARTY_HOURS),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_room_enumeration_is_closed() {
        let rooms = Room::all();
        assert_eq!(rooms.len(), 10);
        assert!(rooms.contains(&Room::Kitchen));
        // Display 值作为存储与日志里的稳定标识
        assert_eq!(Room::BedroomNorth.to_string(), "bedroom_north");
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(TimeRange::new(at(12, 0), at(11, 0)).is_err());
        assert!(TimeRange::new(at(12, 0), at(12, 0)).is_err());
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = TimeRange::new(at(10, 0), at(11, 0)).unwrap();
        let b = TimeRange::new(at(10, 30), at(10, 45)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        // 半开区间：[10:00,11:00) 与 [11:00,11:30) 相邻但不重叠
        let a = TimeRange::new(at(10, 0), at(11, 0)).unwrap();
        let b = TimeRange::new(at(11, 0), at(11, 30)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = TimeRange::new(at(10, 0), at(11, 0)).unwrap();
        assert!(range.contains(at(10, 0)));
        assert!(range.contains(at(10, 59)));
        assert!(!range.contains(at(11, 0)));
    }

    #[test]
    fn test_party_duration_bounds() {
        let too_short = TimeRange::new(at(10, 0), at(10, 10)).unwrap();
        assert!(too_short.validate_party_duration().is_err());

        let ok = TimeRange::new(at(10, 0), at(12, 0)).unwrap();
        assert!(ok.validate_party_duration().is_ok());

        let start = at(0, 0);
        let too_long = TimeRange::new(start, start + Duration::hours(25)).unwrap();
        assert!(too_long.validate_party_duration().is_err());
    }
}
