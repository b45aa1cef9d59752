//! 活动服务单元测试
//!
//! 覆盖创建校验与冲突检测、角色可见性、状态覆盖、
//! 宾客管理与改期/删除的权限规则。

#[cfg(test)]
mod party_service_tests {
    use crate::clock::ManualClock;
    use crate::errors::{ApplicationError, PartyError};
    use crate::house_state::HouseState;
    use crate::memory::{
        InMemoryLogRepository, InMemoryNotificationRepository, InMemoryPartyRepository,
        InMemoryUserRepository,
    };
    use crate::repository::{LogRepository, NotificationRepository, UserRepository};
    use crate::services::notification_service::{
        NotificationService, NotificationServiceDependencies,
    };
    use crate::services::party_service::{
        CreatePartyRequest, PartyService, PartyServiceDependencies,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use domain::{
        AttendanceStatus, LogType, NotificationCategory, PartyCategory, PartyStatus, Room, User,
        UserRole,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        user_repository: Arc<InMemoryUserRepository>,
        log_repository: Arc<InMemoryLogRepository>,
        notification_repository: Arc<InMemoryNotificationRepository>,
        clock: Arc<ManualClock>,
        service: PartyService,
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    /// 次日某时刻
    fn tomorrow(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    fn build_fixture() -> Fixture {
        let party_repository = Arc::new(InMemoryPartyRepository::new());
        let user_repository = Arc::new(InMemoryUserRepository::new());
        let log_repository = Arc::new(InMemoryLogRepository::new());
        let notification_repository = Arc::new(InMemoryNotificationRepository::new());
        let clock = Arc::new(ManualClock::new(base_time()));

        let notifier = Arc::new(NotificationService::new(NotificationServiceDependencies {
            notification_repository: notification_repository.clone(),
            user_repository: user_repository.clone(),
            house_state: Arc::new(HouseState::new()),
            clock: clock.clone(),
        }));

        let service = PartyService::new(PartyServiceDependencies {
            party_repository,
            user_repository: user_repository.clone(),
            log_repository: log_repository.clone(),
            notifier,
            clock: clock.clone(),
        });

        Fixture {
            user_repository,
            log_repository,
            notification_repository,
            clock,
            service,
        }
    }

    async fn add_user(fixture: &Fixture, name: &str, role: UserRole) -> User {
        let user = User::new(name, format!("{}@example.com", name), role, base_time()).unwrap();
        fixture.user_repository.create(user.clone()).await.unwrap();
        user
    }

    fn request(
        name: &str,
        rooms: Vec<Room>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        guest_ids: Vec<Uuid>,
    ) -> CreatePartyRequest {
        CreatePartyRequest {
            name: name.to_string(),
            description: None,
            rooms,
            start,
            end,
            category: PartyCategory::HouseParty,
            guest_ids,
        }
    }

    // --- 创建与校验 ---

    #[tokio::test]
    async fn test_guest_cannot_create_party() {
        let fixture = build_fixture();
        let guest = add_user(&fixture, "gina", UserRole::Guest).await;

        let result = fixture
            .service
            .create_party(
                &guest,
                request(
                    "party",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::InsufficientPermissions(_)))
        ));
    }

    #[tokio::test]
    async fn test_muted_host_cannot_create_unless_admin() {
        let fixture = build_fixture();
        let mut resident = add_user(&fixture, "rui", UserRole::Resident).await;
        resident.muted = true;
        fixture.user_repository.update(resident.clone()).await.unwrap();

        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "party",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::MutedUser(_)))
        ));

        // 静音的管理员可以越过
        let mut admin = add_user(&fixture, "ana", UserRole::Admin).await;
        admin.muted = true;
        fixture.user_repository.update(admin.clone()).await.unwrap();
        let result = fixture
            .service
            .create_party(
                &admin,
                request(
                    "party",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_creation_validation_rules() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;

        // 时长不足 20 分钟
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "short",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(10, 10),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Domain(_))));

        // 时长超过 24 小时
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "long",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(10, 0) + Duration::hours(25),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Domain(_))));

        // 开始时间在过去
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "past",
                    vec![Room::Kitchen],
                    base_time() - Duration::hours(1),
                    base_time() + Duration::hours(1),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Domain(_))));

        // 房间集合为空
        let result = fixture
            .service
            .create_party(
                &resident,
                request("empty", vec![], tomorrow(10, 0), tomorrow(11, 0), vec![]),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Domain(_))));

        // 未知宾客
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "ghosts",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![Uuid::new_v4()],
                ),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overlapping_booking_is_rejected_adjacent_is_not() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;

        // 厨房 [10:00, 11:00)
        fixture
            .service
            .create_party(
                &resident,
                request(
                    "brunch",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 厨房 [10:30, 10:50)：冲突
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "overlap",
                    vec![Room::Kitchen],
                    tomorrow(10, 30),
                    tomorrow(10, 50),
                    vec![],
                ),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::ScheduleConflict { conflicts: 1 }))
        ));

        // 厨房 [11:00, 11:30)：相邻不冲突
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "adjacent",
                    vec![Room::Kitchen],
                    tomorrow(11, 0),
                    tomorrow(11, 30),
                    vec![],
                ),
            )
            .await;
        assert!(result.is_ok());

        // 另一个房间同时段：不冲突
        let result = fixture
            .service
            .create_party(
                &resident,
                request(
                    "elsewhere",
                    vec![Room::Balcony],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_creation_invites_guests_and_logs() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let guest = add_user(&fixture, "gina", UserRole::Guest).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![guest.id],
                ),
            )
            .await
            .unwrap();

        // 新宾客从未定开始
        assert_eq!(party.guests.len(), 1);
        assert_eq!(party.guests[0].attendance, AttendanceStatus::Undecided);
        assert_eq!(party.status, PartyStatus::Scheduled);

        // 宾客收到邀请通知
        let inbox = fixture
            .notification_repository
            .find_by_user(guest.id)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].category, NotificationCategory::Party);
        assert_eq!(inbox[0].party_id, Some(party.id));

        // 创建写审计日志
        let count = fixture
            .log_repository
            .count_since(
                resident.id,
                LogType::PartyCreated,
                base_time() - Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    // --- 可见性 ---

    #[tokio::test]
    async fn test_role_based_visibility() {
        let fixture = build_fixture();
        let admin = add_user(&fixture, "ana", UserRole::Admin).await;
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let invited_guest = add_user(&fixture, "gina", UserRole::Guest).await;
        let other_guest = add_user(&fixture, "dora", UserRole::Guest).await;

        let with_guest = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![invited_guest.id],
                ),
            )
            .await
            .unwrap();
        let ended = fixture
            .service
            .create_party(
                &resident,
                request(
                    "breakfast",
                    vec![Room::Kitchen],
                    base_time() + Duration::hours(1),
                    base_time() + Duration::hours(2),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 推进到 breakfast 已结束
        fixture.clock.advance(Duration::hours(3));

        // 管理员看到全部（含已结束）
        let seen = fixture.service.list_parties(&admin).await.unwrap();
        assert_eq!(seen.len(), 2);
        // 已结束的活动状态被推导并持久化
        assert!(seen.iter().any(|p| p.id == ended.id && p.status == PartyStatus::Completed));

        // 住户看不到已结束的
        let seen = fixture.service.list_parties(&resident).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, with_guest.id);

        // 受邀访客只看到自己的
        let seen = fixture.service.list_parties(&invited_guest).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, with_guest.id);

        // 未受邀访客什么都看不到
        let seen = fixture.service.list_parties(&other_guest).await.unwrap();
        assert!(seen.is_empty());

        // 单条读取遵循同样的规则
        assert!(fixture
            .service
            .get_party(with_guest.id, &invited_guest)
            .await
            .is_ok());
        assert!(matches!(
            fixture.service.get_party(with_guest.id, &other_guest).await,
            Err(ApplicationError::Unauthorized(_))
        ));
    }

    // --- 状态覆盖 ---

    #[tokio::test]
    async fn test_manual_cancel_is_absorbing() {
        let fixture = build_fixture();
        let admin = add_user(&fixture, "ana", UserRole::Admin).await;
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 主办人手动取消
        let cancelled = fixture
            .service
            .update_status(party.id, &resident, PartyStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, PartyStatus::Cancelled);

        // 推进到活动时间窗口内：派生不会把取消翻回进行中
        fixture.clock.set(tomorrow(20, 0));
        let seen = fixture.service.list_parties(&admin).await.unwrap();
        assert_eq!(seen[0].status, PartyStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_status_override_permissions() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let stranger = add_user(&fixture, "sven", UserRole::Resident).await;
        let admin = add_user(&fixture, "ana", UserRole::Admin).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 无关住户不能改
        let result = fixture
            .service
            .update_status(party.id, &stranger, PartyStatus::Cancelled)
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::InsufficientPermissions(_)))
        ));

        // 管理员可以改任何活动
        assert!(fixture
            .service
            .update_status(party.id, &admin, PartyStatus::Cancelled)
            .await
            .is_ok());
    }

    // --- 宾客管理 ---

    #[tokio::test]
    async fn test_guest_management_permissions() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let stranger = add_user(&fixture, "sven", UserRole::Resident).await;
        let guest = add_user(&fixture, "gina", UserRole::Guest).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 非主办人不能加宾客
        let result = fixture.service.add_guest(party.id, &stranger, guest.id).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::InsufficientPermissions(_)))
        ));

        // 主办人加宾客并触发邀请通知
        fixture
            .service
            .add_guest(party.id, &resident, guest.id)
            .await
            .unwrap();
        let inbox = fixture
            .notification_repository
            .find_by_user(guest.id)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);

        // 重复邀请被领域规则拒绝
        let result = fixture.service.add_guest(party.id, &resident, guest.id).await;
        assert!(matches!(result, Err(ApplicationError::Domain(_))));

        // 宾客本人改自己的状态
        fixture
            .service
            .update_guest_status(party.id, &guest, None, AttendanceStatus::Going)
            .await
            .unwrap();

        // 宾客不能改别人的状态
        let result = fixture
            .service
            .update_guest_status(party.id, &guest, Some(resident.id), AttendanceStatus::Late)
            .await;
        assert!(matches!(result, Err(ApplicationError::Unauthorized(_))));

        // 主办人移除宾客
        fixture
            .service
            .remove_guest(party.id, &resident, guest.id)
            .await
            .unwrap();
        let refreshed = fixture.service.get_party(party.id, &resident).await.unwrap();
        assert!(refreshed.guests.is_empty());
    }

    // --- 改期 ---

    #[tokio::test]
    async fn test_reschedule_conflict_excludes_self() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "brunch",
                    vec![Room::Kitchen],
                    tomorrow(10, 0),
                    tomorrow(11, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();
        fixture
            .service
            .create_party(
                &resident,
                request(
                    "lunch",
                    vec![Room::Kitchen],
                    tomorrow(12, 0),
                    tomorrow(13, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        // 改到与自己原时段重叠：排除自身后无冲突
        let result = fixture
            .service
            .reschedule(party.id, &resident, tomorrow(10, 30), tomorrow(11, 30))
            .await;
        assert!(result.is_ok());

        // 改到与另一活动重叠：拒绝
        let result = fixture
            .service
            .reschedule(party.id, &resident, tomorrow(12, 30), tomorrow(13, 30))
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::ScheduleConflict { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reschedule_notifies_participants() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let guest = add_user(&fixture, "gina", UserRole::Guest).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![guest.id],
                ),
            )
            .await
            .unwrap();

        fixture
            .service
            .reschedule(party.id, &resident, tomorrow(20, 0), tomorrow(23, 0))
            .await
            .unwrap();

        // 邀请 + 改期两条通知
        let inbox = fixture
            .notification_repository
            .find_by_user(guest.id)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);
        // 改期也通知主办人
        let host_inbox = fixture
            .notification_repository
            .find_by_user(resident.id)
            .await
            .unwrap();
        assert_eq!(host_inbox.len(), 1);
    }

    // --- 删除 ---

    #[tokio::test]
    async fn test_delete_permissions() {
        let fixture = build_fixture();
        let resident = add_user(&fixture, "rui", UserRole::Resident).await;
        let stranger = add_user(&fixture, "sven", UserRole::Resident).await;
        let admin = add_user(&fixture, "ana", UserRole::Admin).await;

        let party = fixture
            .service
            .create_party(
                &resident,
                request(
                    "dinner",
                    vec![Room::DiningRoom],
                    tomorrow(19, 0),
                    tomorrow(22, 0),
                    vec![],
                ),
            )
            .await
            .unwrap();

        let result = fixture.service.delete_party(party.id, &stranger).await;
        assert!(matches!(result, Err(ApplicationError::Unauthorized(_))));

        // 管理员可删
        fixture.service.delete_party(party.id, &admin).await.unwrap();
        let result = fixture.service.get_party(party.id, &admin).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Party(PartyError::PartyNotFound(_)))
        ));
    }
}
