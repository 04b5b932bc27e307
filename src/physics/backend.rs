//! 外部协作者接口
//!
//! 动画播放引擎与物理引擎都在系统边界之外，这里只规定控制器需要的最小能力。
//! 约定世界坐标系：+Z 为前向，+Y 为上。

use bitflags::bitflags;
use glam::{Quat, Vec3};

use crate::skeleton::BoneId;

// ============================================================================
// 传送范围
// ============================================================================

bitflags! {
    /// 整体传送时触碰到的部分
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TeleportScope: u32 {
        /// 物理骨骼
        const PHYSICS_BONES = 1 << 0;
        /// 物理骨骼的父层级链
        const PARENTS = 1 << 1;
        /// 不带刚体的次级骨骼
        const SECONDARY = 1 << 2;
    }
}

impl TeleportScope {
    /// 全部
    pub const ALL: TeleportScope = TeleportScope::all();
}

// ============================================================================
// 起身动画
// ============================================================================

/// 起身动画片段（按倒地朝向选择）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetUpClip {
    /// 仰面起身
    FromBack,
    /// 俯卧起身
    FromFront,
}

// ============================================================================
// 动画骨架数据源
// ============================================================================

/// 动画骨架数据源
///
/// 处于动画控制时的姿态真值来源。实现方通常包装动画播放引擎，
/// 每帧在姿态阶段写好骨骼变换后再交给控制器读取。
pub trait AnimatedSkeleton {
    /// 骨骼世界位置
    fn bone_position(&self, bone: BoneId) -> Vec3;

    /// 骨骼世界旋转
    fn bone_rotation(&self, bone: BoneId) -> Quat;

    /// 骨骼本地旋转（相对父骨骼）
    fn bone_local_rotation(&self, bone: BoneId) -> Quat;

    /// 角色根对象世界位置
    fn root_position(&self) -> Vec3;

    /// 角色根对象世界旋转
    fn root_rotation(&self) -> Quat;

    /// 原子地设置角色根对象的位置与旋转
    fn set_root_transform(&mut self, position: Vec3, rotation: Quat);

    /// 触发起身动画
    fn play_clip(&mut self, clip: GetUpClip);

    /// 强制每帧求值动画（true 时即使骨架不可见也不做剔除）
    fn set_always_animate(&mut self, always: bool);

    /// 切换动画骨架的渲染可见性
    fn set_renderers_enabled(&mut self, enabled: bool);
}

// ============================================================================
// 物理骨架
// ============================================================================

/// 物理骨架（布娃娃）
///
/// 每根物理骨骼对应一个刚体；除根骨骼（Hips）外各有一个连向父骨骼的关节。
/// 对不存在关节的骨骼调用关节方法是空操作。
pub trait PhysicalSkeleton {
    /// 刚体世界位置
    fn body_position(&self, bone: BoneId) -> Vec3;

    /// 刚体世界旋转
    fn body_rotation(&self, bone: BoneId) -> Quat;

    /// 刚体本地旋转（相对父骨骼）
    fn body_local_rotation(&self, bone: BoneId) -> Quat;

    /// 刚体质心（世界空间）
    fn mass_center(&self, bone: BoneId) -> Vec3;

    /// 刚体线速度
    fn linear_velocity(&self, bone: BoneId) -> Vec3;

    /// 设置刚体线速度
    fn set_linear_velocity(&mut self, bone: BoneId, velocity: Vec3);

    /// 在世界点施加速度变化冲量（不随帧率变化）
    fn apply_velocity_change(&mut self, bone: BoneId, impulse: Vec3, point: Vec3);

    /// 切换运动学模式（true 时物理不接管，骨架被动跟随）
    fn set_kinematic(&mut self, kinematic: bool);

    /// 将整个物理骨架传送到动画骨架的当前姿态
    fn teleport_to_master(&mut self, scope: TeleportScope, master: &dyn AnimatedSkeleton);

    /// 保存当前完整姿态快照
    fn save_snapshot(&mut self);

    /// 按权重加载快照：snapshot_weight=1 完全使用快照，=0 完全使用动画姿态
    fn load_snapshot(&mut self, snapshot_weight: f32, master: &dyn AnimatedSkeleton);

    /// 关节的主轴与副轴（本地空间），根骨骼返回 None
    fn joint_axes(&self, bone: BoneId) -> Option<(Vec3, Vec3)>;

    /// 设置关节目标旋转（关节本地坐标系）
    fn set_joint_target(&mut self, bone: BoneId, target: Quat);

    /// 设置关节驱动强度
    fn set_joint_drive(&mut self, bone: BoneId, spring: f32);

    /// 切换物理骨架的渲染可见性
    fn set_renderers_enabled(&mut self, enabled: bool);
}

// ============================================================================
// 地面检测
// ============================================================================

/// 地面射线检测
pub trait GroundRaycast {
    /// 从 origin 向下发射单次射线，命中时返回命中点
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: u32) -> Option<Vec3>;
}
