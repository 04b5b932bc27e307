//! 骨骼定义
//!
//! 核心设计思想：
//! - BoneId: 稠密的人形骨骼枚举，物理骨骼子集在初始化时一次性解析为数组下标
//! - 每根物理骨骼与动画侧的同名骨骼一一对应，映射建立后不再变化
//! - 每步循环中只用数组下标访问，不做哈希查找

mod math;

pub use math::{look_rotation, max_abs, max_abs_vec3};

use glam::{Mat4, Quat, Vec3};

// ============================================================================
// 骨骼枚举
// ============================================================================

/// 人形骨骼枚举
///
/// 覆盖完整的人形骨架；其中只有 [`PHYSICS_BONES`] 列出的子集携带刚体。
/// 对非物理骨骼设置衰减等操作会被拒绝。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoneId {
    Hips,
    Spine,
    Chest,
    Neck,
    Head,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightUpperArm,
    RightLowerArm,
    RightHand,
}

/// 物理骨骼数量
pub const PHYSICS_BONE_COUNT: usize = 11;

/// 物理骨骼集合（顺序固定，Hips 必须在下标 0，是唯一没有关节的根骨骼）
pub const PHYSICS_BONES: [BoneId; PHYSICS_BONE_COUNT] = [
    BoneId::Hips,
    BoneId::Chest,
    BoneId::Head,
    BoneId::RightUpperLeg,
    BoneId::RightLowerLeg,
    BoneId::LeftUpperLeg,
    BoneId::LeftLowerLeg,
    BoneId::RightUpperArm,
    BoneId::RightLowerArm,
    BoneId::LeftUpperArm,
    BoneId::LeftLowerArm,
];

/// 解析物理骨骼下标（非物理骨骼返回 None）
#[inline]
pub fn physics_bone_index(bone: BoneId) -> Option<usize> {
    match bone {
        BoneId::Hips => Some(0),
        BoneId::Chest => Some(1),
        BoneId::Head => Some(2),
        BoneId::RightUpperLeg => Some(3),
        BoneId::RightLowerLeg => Some(4),
        BoneId::LeftUpperLeg => Some(5),
        BoneId::LeftLowerLeg => Some(6),
        BoneId::RightUpperArm => Some(7),
        BoneId::RightLowerArm => Some(8),
        BoneId::LeftUpperArm => Some(9),
        BoneId::LeftLowerArm => Some(10),
        _ => None,
    }
}

// ============================================================================
// 骨骼变换
// ============================================================================

/// 骨骼变换数据（世界或本地空间，由使用处决定）
#[derive(Clone, Copy, Debug)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BoneTransform {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// 从矩阵分解
    #[inline]
    pub fn from_matrix(m: Mat4) -> Self {
        let (_, rotation, translation) = m.to_scale_rotation_translation();
        Self { translation, rotation }
    }

    /// 两个变换之间插值（平移 lerp，旋转 slerp）
    #[inline]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }
}
