//! 应用层错误定义
//!
//! 定义应用层特定的错误类型。门禁拒绝原因使用可机读的独立变体，
//! 调用方可以据此区分限流、静音、维护与未受邀。

use crate::hardware::{ChannelError, DoorStage};
use crate::repository::RepositoryError;
use domain::errors::DomainError;
use thiserror::Error;
use uuid::Uuid;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 活动相关错误
    #[error("活动错误: {0}")]
    Party(#[from] PartyError),

    /// 门禁相关错误
    #[error("门禁错误: {0}")]
    Door(#[from] DoorError),

    /// 领域层错误
    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    /// 存储层错误
    #[error("存储错误: {0}")]
    Repository(#[from] RepositoryError),

    /// 未找到资源
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 权限不足
    #[error("权限不足: {0}")]
    Unauthorized(String),

    /// 验证错误
    #[error("验证失败: {0}")]
    Validation(String),

    /// 基础设施层错误
    #[error("基础设施错误: {0}")]
    Infrastructure(String),
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// 活动服务错误
#[derive(Debug, Error)]
pub enum PartyError {
    /// 活动不存在
    #[error("活动不存在: {0}")]
    PartyNotFound(Uuid),

    /// 排期冲突
    #[error("排期冲突: 所选房间在该时间段已有 {conflicts} 个活动")]
    ScheduleConflict { conflicts: usize },

    /// 权限不足
    #[error("权限不足: {0}")]
    InsufficientPermissions(String),

    /// 用户被静音
    #[error("你已被静音: {0}")]
    MutedUser(String),

    /// 验证错误
    #[error("验证失败: {0}")]
    Validation(String),
}

/// 门禁错误：拒绝原因与硬件故障
#[derive(Debug, Error)]
pub enum DoorError {
    /// 限流拒绝
    #[error("10秒内开门次数过多，请稍候再试")]
    RateLimited,

    /// 静音拒绝
    #[error("你已被静音，不能开门")]
    Muted,

    /// 维护模式拒绝
    #[error("维护模式开启中，门禁已禁用")]
    MaintenanceActive,

    /// 未受邀拒绝
    #[error("你没有被任何进行中的活动邀请")]
    NotInvited,

    /// 门硬件正被另一次开门占用
    #[error("门硬件正忙，请稍候再试")]
    Busy,

    /// 硬件明确报告失败
    #[error("{stage}门开启失败")]
    StageFailed { stage: DoorStage },

    /// 等待硬件应答超时
    #[error("{stage}门应答超时")]
    StageTimedOut { stage: DoorStage },

    /// 硬件通道错误
    #[error("硬件通道错误: {0}")]
    Channel(#[from] ChannelError),

    /// 判定所需的存储查询失败
    #[error("存储错误: {0}")]
    Storage(String),
}
