//! 骨骼衰减表
//!
//! 按骨骼局部抑制跟随行为的可变覆盖表。
//! 外部冲击（子弹、碰撞）写入衰减值，让被击中的骨骼暂时不追动画；
//! 同一次布娃娃过程内只增不减，新的过程开始前整表清零。

use crate::error::RagdollError;
use crate::profile::ControllerProfile;
use crate::skeleton::{physics_bone_index, BoneId, PHYSICS_BONE_COUNT};

/// 骨骼衰减表
///
/// 固定长度数组，下标与 PHYSICS_BONES 一致。值域 [0, ∞)，
/// 使用处与曲线输出相减后钳制到 [0,1]。
#[derive(Debug, Clone, Default)]
pub struct BoneDecayTable {
    decays: [f32; PHYSICS_BONE_COUNT],
}

impl BoneDecayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按物理骨骼下标读取
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.decays[index]
    }

    /// 按骨骼读取（非物理骨骼返回 None）
    pub fn decay(&self, bone: BoneId) -> Option<f32> {
        physics_bone_index(bone).map(|i| self.decays[i])
    }

    /// 设置骨骼衰减
    ///
    /// 累加写入（同一过程内被击中两次不会被较低的值覆盖回去）。
    /// `neighbor_value` > 0 时向档案邻居表做一层传播（邻居不再继续扩散）。
    /// 非物理骨骼被拒绝，表保持不变。
    pub fn set_decay(
        &mut self,
        profile: &ControllerProfile,
        bone: BoneId,
        value: f32,
        neighbor_value: f32,
    ) -> Result<(), RagdollError> {
        let Some(index) = physics_bone_index(bone) else {
            log::error!("[Ragdoll] 骨骼 {:?} 不是物理骨骼，无法设置衰减", bone);
            return Err(RagdollError::NotPhysicsBone(bone));
        };

        self.decays[index] += value;

        if neighbor_value > 0.0 {
            for neighbor in &profile.bones[index].neighbors {
                // 邻居在档案校验时已保证是物理骨骼；传播深度为 1
                let _ = self.set_decay(profile, *neighbor, neighbor_value, 0.0);
            }
        }
        Ok(())
    }

    /// 整表清零（每次新的布娃娃过程开始前调用）
    pub fn reset_all(&mut self) {
        self.decays = [0.0; PHYSICS_BONE_COUNT];
    }
}
