//! 控制器档案
//!
//! 运行期只读的配置数据：每根物理骨骼的衰减曲线、邻居表、力上限，
//! 以及全局的时序与力度常数。多个控制器实例可以共享同一份（Arc）。

use std::sync::Arc;

use crate::animation::DecayCurve;
use crate::error::RagdollError;
use crate::skeleton::{physics_bone_index, BoneId, PHYSICS_BONES, PHYSICS_BONE_COUNT};

// ============================================================================
// 跟随方式
// ============================================================================

/// 坠落期间物理骨架追踪动画骨架的方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FollowMode {
    /// 直接设置刚体速度为动画速度（按衰减混合）
    #[default]
    VelocitySet,
    /// PD 控制器输出速度变化冲量
    PdController,
}

// ============================================================================
// 单骨骼档案
// ============================================================================

/// 单根物理骨骼的档案
#[derive(Clone, Debug)]
pub struct BoneProfile {
    /// 对应骨骼（必须与 PHYSICS_BONES 顺序一致）
    pub bone: BoneId,
    /// PD 力输入系数（0 表示该骨骼不施加跟随力）
    pub input_force: f32,
    /// 该骨骼的力上限（与全局上限取较小者）
    pub max_force: f32,
    /// 关节扭矩权重
    pub max_torque: f32,
    /// 跟随力衰减曲线（输入为坠落进度 1-fallDecay）
    pub fall_force_decay: DecayCurve,
    /// 关节扭矩衰减曲线
    pub fall_torque_decay: DecayCurve,
    /// 邻居骨骼（骨骼衰减向它们做一层传播）
    pub neighbors: Vec<BoneId>,
}

impl BoneProfile {
    /// 默认骨骼档案
    pub fn new(bone: BoneId, neighbors: Vec<BoneId>) -> Self {
        Self {
            bone,
            input_force: 1.0,
            max_force: 10.0,
            max_torque: 1.0,
            fall_force_decay: DecayCurve::fade_out(),
            fall_torque_decay: DecayCurve::fade_out(),
            neighbors,
        }
    }
}

// ============================================================================
// 控制器档案
// ============================================================================

/// 控制器档案（运行期只读）
#[derive(Clone, Debug)]
pub struct ControllerProfile {
    /// 每根物理骨骼的档案，顺序与 PHYSICS_BONES 一致
    pub bones: Vec<BoneProfile>,

    // ========== PD 控制 ==========
    /// 比例系数 P
    pub p_force: f32,
    /// 微分系数 D
    pub d_force: f32,
    /// 全局力上限（速度变化量级）
    pub max_force: f32,

    // ========== 坠落 ==========
    /// 全局关节扭矩上限
    pub max_torque: f32,
    /// 默认坠落衰减速度（可被 set_fall_speed 覆盖）
    pub fall_decay_speed: f32,
    /// 动画速度低于此阈值时补重力（防止静止动画把骨骼顶在空中）
    pub max_gravity_add_velocity: f32,
    /// 跟随方式
    pub follow_mode: FollowMode,

    // ========== 起身 ==========
    /// 完全布娃娃状态的最短持续时间（秒）
    pub ragdoll_min_time: f32,
    /// 根骨骼速度低于此值视为静止（m/s）
    pub settled_speed: f32,
    /// 起身动画过渡到躺姿所需等待时间（秒）
    pub orientate_delay: f32,
    /// 物理姿态混合回动画的时长（秒）
    pub blend_time: f32,
    /// 地面检测层掩码
    pub check_ground_mask: u32,
}

impl Default for ControllerProfile {
    fn default() -> Self {
        Self::humanoid()
    }
}

impl ControllerProfile {
    /// 标准人形档案（含默认邻居表）
    pub fn humanoid() -> Self {
        use BoneId::*;

        let neighbors: [Vec<BoneId>; PHYSICS_BONE_COUNT] = [
            vec![Chest, LeftUpperLeg, RightUpperLeg], // Hips
            vec![Hips, Head, LeftUpperArm, RightUpperArm], // Chest
            vec![Chest],                              // Head
            vec![Hips, RightLowerLeg],                // RightUpperLeg
            vec![RightUpperLeg],                      // RightLowerLeg
            vec![Hips, LeftLowerLeg],                 // LeftUpperLeg
            vec![LeftUpperLeg],                       // LeftLowerLeg
            vec![Chest, RightLowerArm],               // RightUpperArm
            vec![RightUpperArm],                      // RightLowerArm
            vec![Chest, LeftLowerArm],                // LeftUpperArm
            vec![LeftUpperArm],                       // LeftLowerArm
        ];

        let bones = PHYSICS_BONES
            .iter()
            .zip(neighbors)
            .map(|(bone, n)| BoneProfile::new(*bone, n))
            .collect();

        Self {
            bones,
            p_force: 30.0,
            d_force: 1.5,
            max_force: 10.0,
            max_torque: 10000.0,
            fall_decay_speed: 3.0,
            max_gravity_add_velocity: 1.0,
            follow_mode: FollowMode::VelocitySet,
            ragdoll_min_time: 3.0,
            settled_speed: 0.05,
            orientate_delay: 1.0,
            blend_time: 0.5,
            check_ground_mask: 1,
        }
    }

    /// 校验档案
    ///
    /// 骨骼表必须与 PHYSICS_BONES 顺序一致，时序常数必须为正，
    /// 邻居必须是物理骨骼且不指向自己。
    pub fn validate(&self) -> Result<(), RagdollError> {
        if self.bones.len() != PHYSICS_BONE_COUNT {
            return Err(RagdollError::InvalidProfile(format!(
                "骨骼档案数量 {} != {}",
                self.bones.len(),
                PHYSICS_BONE_COUNT
            )));
        }
        for (i, bp) in self.bones.iter().enumerate() {
            if bp.bone != PHYSICS_BONES[i] {
                return Err(RagdollError::InvalidProfile(format!(
                    "下标 {} 处骨骼 {:?} 与物理骨骼表不一致",
                    i, bp.bone
                )));
            }
            for n in &bp.neighbors {
                if *n == bp.bone {
                    return Err(RagdollError::InvalidProfile(format!(
                        "骨骼 {:?} 的邻居表包含自己",
                        bp.bone
                    )));
                }
                if physics_bone_index(*n).is_none() {
                    return Err(RagdollError::InvalidProfile(format!(
                        "骨骼 {:?} 的邻居 {:?} 不是物理骨骼",
                        bp.bone, n
                    )));
                }
            }
        }
        if self.blend_time <= 0.0 {
            return Err(RagdollError::InvalidProfile("blend_time 必须为正".into()));
        }
        if self.fall_decay_speed <= 0.0 {
            return Err(RagdollError::InvalidProfile(
                "fall_decay_speed 必须为正".into(),
            ));
        }
        if self.orientate_delay < 0.0 || self.ragdoll_min_time < 0.0 {
            return Err(RagdollError::InvalidProfile("时序常数不能为负".into()));
        }
        Ok(())
    }

    /// 便捷方法：校验后包进 Arc
    pub fn into_shared(self) -> Result<Arc<Self>, RagdollError> {
        self.validate()?;
        Ok(Arc::new(self))
    }
}
