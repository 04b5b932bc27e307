//! 测试用骨架对
//!
//! 一个最小的动画/物理骨架实现：姿态存在数组里，
//! 冲量与关节写入都被记录下来，供状态机测试断言。

use glam::{Quat, Vec3};

use super::backend::{AnimatedSkeleton, GetUpClip, GroundRaycast, PhysicalSkeleton, TeleportScope};
use super::commands::BoneImpulse;
use crate::skeleton::{physics_bone_index, BoneId, PHYSICS_BONE_COUNT};

#[inline]
fn idx(bone: BoneId) -> usize {
    physics_bone_index(bone).expect("mock 只处理物理骨骼")
}

/// 站立姿态的骨骼位置（测试用的大致人形）
fn standing_pose() -> [Vec3; PHYSICS_BONE_COUNT] {
    [
        Vec3::new(0.0, 1.0, 0.0),    // Hips
        Vec3::new(0.0, 1.35, 0.0),   // Chest
        Vec3::new(0.0, 1.7, 0.0),    // Head
        Vec3::new(0.15, 0.8, 0.0),   // RightUpperLeg
        Vec3::new(0.15, 0.4, 0.0),   // RightLowerLeg
        Vec3::new(-0.15, 0.8, 0.0),  // LeftUpperLeg
        Vec3::new(-0.15, 0.4, 0.0),  // LeftLowerLeg
        Vec3::new(0.35, 1.4, 0.0),   // RightUpperArm
        Vec3::new(0.55, 1.15, 0.0),  // RightLowerArm
        Vec3::new(-0.35, 1.4, 0.0),  // LeftUpperArm
        Vec3::new(-0.55, 1.15, 0.0), // LeftLowerArm
    ]
}

// ============================================================================
// 动画骨架
// ============================================================================

/// 动画骨架 mock
pub struct MockMaster {
    pub positions: [Vec3; PHYSICS_BONE_COUNT],
    pub rotations: [Quat; PHYSICS_BONE_COUNT],
    pub local_rotations: [Quat; PHYSICS_BONE_COUNT],
    pub root_position: Vec3,
    pub root_rotation: Quat,
    pub played_clips: Vec<GetUpClip>,
    pub always_animate: bool,
    pub renderers_enabled: bool,
}

impl MockMaster {
    pub fn new() -> Self {
        Self {
            positions: standing_pose(),
            rotations: [Quat::IDENTITY; PHYSICS_BONE_COUNT],
            local_rotations: [Quat::IDENTITY; PHYSICS_BONE_COUNT],
            root_position: Vec3::ZERO,
            root_rotation: Quat::IDENTITY,
            played_clips: Vec::new(),
            always_animate: false,
            renderers_enabled: true,
        }
    }

    /// 模拟动画整体移动一帧
    pub fn advance(&mut self, delta: Vec3) {
        for p in &mut self.positions {
            *p += delta;
        }
        self.root_position += delta;
    }
}

impl AnimatedSkeleton for MockMaster {
    fn bone_position(&self, bone: BoneId) -> Vec3 {
        self.positions[idx(bone)]
    }

    fn bone_rotation(&self, bone: BoneId) -> Quat {
        self.rotations[idx(bone)]
    }

    fn bone_local_rotation(&self, bone: BoneId) -> Quat {
        self.local_rotations[idx(bone)]
    }

    fn root_position(&self) -> Vec3 {
        self.root_position
    }

    fn root_rotation(&self) -> Quat {
        self.root_rotation
    }

    fn set_root_transform(&mut self, position: Vec3, rotation: Quat) {
        self.root_position = position;
        self.root_rotation = rotation;
    }

    fn play_clip(&mut self, clip: GetUpClip) {
        self.played_clips.push(clip);
    }

    fn set_always_animate(&mut self, always: bool) {
        self.always_animate = always;
    }

    fn set_renderers_enabled(&mut self, enabled: bool) {
        self.renderers_enabled = enabled;
    }
}

// ============================================================================
// 物理骨架
// ============================================================================

/// 物理骨架 mock
pub struct MockRagdoll {
    pub positions: [Vec3; PHYSICS_BONE_COUNT],
    pub rotations: [Quat; PHYSICS_BONE_COUNT],
    pub local_rotations: [Quat; PHYSICS_BONE_COUNT],
    pub velocities: [Vec3; PHYSICS_BONE_COUNT],
    /// 质心相对刚体原点的本地偏移
    pub com_offsets: [Vec3; PHYSICS_BONE_COUNT],
    pub kinematic: bool,
    pub renderers_enabled: bool,
    pub applied_impulses: Vec<BoneImpulse>,
    pub joint_targets: [Option<Quat>; PHYSICS_BONE_COUNT],
    pub joint_drives: [f32; PHYSICS_BONE_COUNT],
    /// 关节驱动实际写入次数（验证只在变化时重写）
    pub drive_writes: usize,
    pub last_snapshot_weight: Option<f32>,
    snapshot: Option<([Vec3; PHYSICS_BONE_COUNT], [Quat; PHYSICS_BONE_COUNT])>,
}

impl MockRagdoll {
    pub fn new() -> Self {
        Self {
            positions: standing_pose(),
            rotations: [Quat::IDENTITY; PHYSICS_BONE_COUNT],
            local_rotations: [Quat::IDENTITY; PHYSICS_BONE_COUNT],
            velocities: [Vec3::ZERO; PHYSICS_BONE_COUNT],
            com_offsets: [Vec3::ZERO; PHYSICS_BONE_COUNT],
            kinematic: true,
            renderers_enabled: false,
            applied_impulses: Vec::new(),
            joint_targets: [None; PHYSICS_BONE_COUNT],
            joint_drives: [0.0; PHYSICS_BONE_COUNT],
            drive_writes: 0,
            last_snapshot_weight: None,
            snapshot: None,
        }
    }
}

impl PhysicalSkeleton for MockRagdoll {
    fn body_position(&self, bone: BoneId) -> Vec3 {
        self.positions[idx(bone)]
    }

    fn body_rotation(&self, bone: BoneId) -> Quat {
        self.rotations[idx(bone)]
    }

    fn body_local_rotation(&self, bone: BoneId) -> Quat {
        self.local_rotations[idx(bone)]
    }

    fn mass_center(&self, bone: BoneId) -> Vec3 {
        let i = idx(bone);
        self.positions[i] + self.rotations[i] * self.com_offsets[i]
    }

    fn linear_velocity(&self, bone: BoneId) -> Vec3 {
        self.velocities[idx(bone)]
    }

    fn set_linear_velocity(&mut self, bone: BoneId, velocity: Vec3) {
        self.velocities[idx(bone)] = velocity;
    }

    fn apply_velocity_change(&mut self, bone: BoneId, impulse: Vec3, point: Vec3) {
        let i = idx(bone);
        self.velocities[i] += impulse;
        self.applied_impulses
            .push(BoneImpulse::at_point(bone, impulse, point));
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    fn teleport_to_master(&mut self, _scope: TeleportScope, master: &dyn AnimatedSkeleton) {
        for (i, bone) in crate::skeleton::PHYSICS_BONES.iter().enumerate() {
            self.positions[i] = master.bone_position(*bone);
            self.rotations[i] = master.bone_rotation(*bone);
        }
    }

    fn save_snapshot(&mut self) {
        self.snapshot = Some((self.positions, self.rotations));
    }

    fn load_snapshot(&mut self, snapshot_weight: f32, master: &dyn AnimatedSkeleton) {
        self.last_snapshot_weight = Some(snapshot_weight);
        let Some((snap_pos, snap_rot)) = self.snapshot else {
            return;
        };
        for (i, bone) in crate::skeleton::PHYSICS_BONES.iter().enumerate() {
            let anim_pos = master.bone_position(*bone);
            let anim_rot = master.bone_rotation(*bone);
            self.positions[i] = anim_pos.lerp(snap_pos[i], snapshot_weight);
            self.rotations[i] = anim_rot.slerp(snap_rot[i], snapshot_weight);
        }
    }

    fn joint_axes(&self, bone: BoneId) -> Option<(Vec3, Vec3)> {
        if idx(bone) == 0 {
            None
        } else {
            Some((Vec3::X, Vec3::Y))
        }
    }

    fn set_joint_target(&mut self, bone: BoneId, target: Quat) {
        self.joint_targets[idx(bone)] = Some(target);
    }

    fn set_joint_drive(&mut self, bone: BoneId, spring: f32) {
        self.joint_drives[idx(bone)] = spring;
        self.drive_writes += 1;
    }

    fn set_renderers_enabled(&mut self, enabled: bool) {
        self.renderers_enabled = enabled;
    }
}

// ============================================================================
// 地面
// ============================================================================

/// 平面地面 mock
pub struct MockGround {
    pub height: f32,
    pub mask: u32,
}

impl MockGround {
    pub fn new(height: f32) -> Self {
        Self { height, mask: 1 }
    }
}

impl GroundRaycast for MockGround {
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: u32) -> Option<Vec3> {
        if mask & self.mask == 0 {
            return None;
        }
        let drop = origin.y - self.height;
        if drop < 0.0 || drop > max_distance {
            return None;
        }
        Some(Vec3::new(origin.x, self.height, origin.z))
    }
}
