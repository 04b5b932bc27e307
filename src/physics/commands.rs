//! 延迟物理指令队列
//!
//! 物理控制尚未接管时（例如动画速度捕获窗口内命中了子弹），
//! 冲量请求不能立即作用于刚体，也不能悄悄丢掉。
//! 这里把请求存成纯数据指令，在物理启用后的第一个物理步一次性执行并清空。

use glam::Vec3;

use super::backend::PhysicalSkeleton;
use crate::config::get_config;
use crate::skeleton::BoneId;

/// 骨骼冲量指令（速度变化语义）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneImpulse {
    /// 作用骨骼
    pub bone: BoneId,
    /// 冲量（速度变化量）
    pub impulse: Vec3,
    /// 作用点（世界空间）
    pub point: Vec3,
}

impl BoneImpulse {
    /// 在指定世界点施加冲量
    pub fn at_point(bone: BoneId, impulse: Vec3, point: Vec3) -> Self {
        Self { bone, impulse, point }
    }
}

/// 延迟物理指令队列（有界）
#[derive(Debug, Default)]
pub struct DeferredPhysics {
    queue: Vec<BoneImpulse>,
}

impl DeferredPhysics {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// 入队一条指令
    ///
    /// 队列达到配置上限时丢弃并记录警告（捕获窗口只有一两帧，正常不会满）。
    pub fn store(&mut self, command: BoneImpulse) {
        let limit = get_config().max_deferred_commands;
        if self.queue.len() >= limit {
            log::warn!(
                "[Ragdoll] 延迟物理队列已满 ({}), 丢弃作用于 {:?} 的指令",
                limit,
                command.bone
            );
            return;
        }
        self.queue.push(command);
    }

    /// 执行全部指令并清空（每条指令恰好执行一次；队列为空时是空操作）
    pub fn drain<P: PhysicalSkeleton>(&mut self, ragdoll: &mut P) {
        if self.queue.is_empty() {
            return;
        }
        for cmd in self.queue.drain(..) {
            ragdoll.apply_velocity_change(cmd.bone, cmd.impulse, cmd.point);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// 清空而不执行（控制器重建时用）
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
