//! 全局房屋状态
//!
//! 维护模式与注册封锁两个进程级开关。用原子变量收敛在一个
//! 显式注入的访问器对象里，取代散落的全局可变标志。

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct HouseState {
    maintenance: AtomicBool,
    registration_blocked: AtomicBool,
}

impl HouseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 维护模式是否开启（开启时仅特权角色可开门）
    pub fn maintenance_active(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }

    pub fn set_maintenance(&self, active: bool) {
        self.maintenance.store(active, Ordering::SeqCst);
    }

    /// 新用户注册是否被封锁
    pub fn registration_blocked(&self) -> bool {
        self.registration_blocked.load(Ordering::SeqCst)
    }

    pub fn set_registration_blocked(&self, blocked: bool) {
        self.registration_blocked.store(blocked, Ordering::SeqCst);
    }
}
