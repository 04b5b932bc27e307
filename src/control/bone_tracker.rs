//! 物理骨骼跟踪器
//!
//! 每根物理骨骼一个：PD 控制律算出把刚体质心拉向动画骨骼的世界力，
//! 以速度变化冲量施加（不随帧率变化）；另外把动画本地旋转换算到
//! 关节本地坐标系作为关节驱动目标。
//!
//! 关节空间基变换在构造时一次性计算；驱动强度只在变化时重写。

use glam::{Quat, Vec3};

use crate::physics::{AnimatedSkeleton, PhysicalSkeleton};
use crate::profile::{BoneProfile, ControllerProfile};
use crate::skeleton::{look_rotation, BoneId};

/// 物理骨骼跟踪器
#[derive(Debug, Clone)]
pub struct PhysicalBoneTracker {
    /// 对应骨骼
    pub bone: BoneId,
    /// 物理骨骼下标
    pub index: usize,
    /// 运行时强度系数（外部可调，0 表示完全关闭该骨骼的跟随力）
    pub runtime_multiplier: f32,

    /// 刚体质心在刚体本地空间的偏移（构造时计算一次）
    mass_center_offset: Vec3,
    /// 上一步的位置误差（PD 微分项）
    force_last_error: Vec3,

    /// 关节本地坐标系的逆基变换（构造时计算一次）
    local_to_joint_space: Quat,
    /// 初始本地旋转在关节空间的表达
    start_local_rotation: Quat,
    has_joint: bool,
    /// 上次写入的驱动强度（-1 保证首次写入一定生效）
    last_joint_torque: f32,
}

impl PhysicalBoneTracker {
    /// 从物理骨架初始化
    ///
    /// 必须在骨架对建立后、姿态未被物理扰动前调用。
    pub fn new<P: PhysicalSkeleton>(bone: BoneId, index: usize, ragdoll: &P) -> Self {
        let (local_to_joint_space, start_local_rotation, has_joint) = match ragdoll.joint_axes(bone)
        {
            Some((axis, secondary)) => {
                let to_joint = look_rotation(axis.cross(secondary), secondary);
                let start = ragdoll.body_local_rotation(bone) * to_joint;
                (to_joint.inverse(), start, true)
            }
            None => (Quat::IDENTITY, Quat::IDENTITY, false),
        };

        let mass_center_offset = ragdoll.body_rotation(bone).inverse()
            * (ragdoll.mass_center(bone) - ragdoll.body_position(bone));

        Self {
            bone,
            index,
            runtime_multiplier: 1.0,
            mass_center_offset,
            force_last_error: Vec3::ZERO,
            local_to_joint_space,
            start_local_rotation,
            has_joint,
            last_joint_torque: -1.0,
        }
    }

    /// 刚体质心偏移（速度跟踪器用它跟踪同一个点）
    #[inline]
    pub fn mass_center_offset(&self) -> Vec3 {
        self.mass_center_offset
    }

    /// 施加 PD 跟随力
    ///
    /// 力上限取全局与单骨骼上限的较小者，再乘运行时系数。
    /// `reci_delta_time` 必须来自一个已知非零的物理步长。
    pub fn apply_follow_force<A, P>(
        &mut self,
        profile: &ControllerProfile,
        bone_profile: &BoneProfile,
        max_force: f32,
        reci_delta_time: f32,
        master: &A,
        ragdoll: &mut P,
    ) where
        A: AnimatedSkeleton + ?Sized,
        P: PhysicalSkeleton,
    {
        let mut force_error = Vec3::ZERO;

        if bone_profile.input_force != 0.0 && max_force != 0.0 && self.runtime_multiplier != 0.0 {
            let desired = master.bone_position(self.bone)
                + master.bone_rotation(self.bone) * self.mass_center_offset;
            let mass_center = ragdoll.mass_center(self.bone);
            force_error = desired - mass_center;

            let force = pd_control(
                profile.p_force * bone_profile.input_force,
                profile.d_force,
                force_error,
                self.force_last_error,
                max_force.min(bone_profile.max_force) * self.runtime_multiplier,
                reci_delta_time,
            );
            ragdoll.apply_velocity_change(self.bone, force, mass_center);
        }

        self.force_last_error = force_error;
    }

    /// 关节跟随：更新驱动强度与目标旋转
    ///
    /// 驱动强度只在变化时重写；强度为零时不重算目标
    /// （省掉无用功，也不和已禁用的驱动较劲）。
    pub fn follow_joint<P: PhysicalSkeleton>(
        &mut self,
        torque: f32,
        master_local_rotation: Quat,
        ragdoll: &mut P,
    ) {
        if !self.has_joint {
            return;
        }

        if torque != self.last_joint_torque {
            self.last_joint_torque = torque;
            ragdoll.set_joint_drive(self.bone, torque);
        }

        if torque != 0.0 {
            let target =
                self.local_to_joint_space * master_local_rotation.inverse() * self.start_local_rotation;
            ragdoll.set_joint_target(self.bone, target);
        }
    }
}

/// PD 控制律
///
/// force = clamp(P * error + D * (error - last_error) * reci_dt, max_magnitude)
fn pd_control(
    p: f32,
    d: f32,
    error: Vec3,
    last_error: Vec3,
    max_magnitude: f32,
    reci_delta_time: f32,
) -> Vec3 {
    let signal = error * p + (error - last_error) * reci_delta_time * d;
    signal.clamp_length_max(max_magnitude.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::mock::{MockMaster, MockRagdoll};
    use crate::profile::ControllerProfile;
    use crate::skeleton::PHYSICS_BONES;

    fn tracker_for(index: usize, ragdoll: &MockRagdoll) -> PhysicalBoneTracker {
        PhysicalBoneTracker::new(PHYSICS_BONES[index], index, ragdoll)
    }

    #[test]
    fn test_pd_clamped() {
        let big_error = Vec3::new(100.0, 0.0, 0.0);
        let f = pd_control(30.0, 1.5, big_error, Vec3::ZERO, 10.0, 60.0);
        assert!((f.length() - 10.0).abs() < 1e-4);

        let small_error = Vec3::new(0.01, 0.0, 0.0);
        let f = pd_control(30.0, 0.0, small_error, small_error, 10.0, 60.0);
        assert!((f - Vec3::new(0.3, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_follow_force_pulls_toward_master() {
        let profile = ControllerProfile::humanoid();
        let master = MockMaster::new();
        let mut ragdoll = MockRagdoll::new();
        let mut tracker = tracker_for(1, &ragdoll);

        // 物理骨骼偏离动画骨骼 0.2m（+X）
        ragdoll.positions[1].x -= 0.2;

        tracker.apply_follow_force(&profile, &profile.bones[1], 10.0, 60.0, &master, &mut ragdoll);

        assert_eq!(ragdoll.applied_impulses.len(), 1);
        let impulse = ragdoll.applied_impulses[0].impulse;
        assert!(impulse.x > 0.0, "力应当指向动画骨骼");
        assert!(impulse.length() <= 10.0 + 1e-4);
    }

    #[test]
    fn test_zero_multiplier_no_force() {
        let profile = ControllerProfile::humanoid();
        let master = MockMaster::new();
        let mut ragdoll = MockRagdoll::new();
        let mut tracker = tracker_for(1, &ragdoll);
        tracker.runtime_multiplier = 0.0;

        ragdoll.positions[1].x -= 0.2;
        tracker.apply_follow_force(&profile, &profile.bones[1], 10.0, 60.0, &master, &mut ragdoll);
        assert!(ragdoll.applied_impulses.is_empty());
    }

    #[test]
    fn test_joint_drive_written_on_change_only() {
        let mut ragdoll = MockRagdoll::new();
        let mut tracker = tracker_for(2, &ragdoll);

        tracker.follow_joint(500.0, Quat::IDENTITY, &mut ragdoll);
        assert_eq!(ragdoll.drive_writes, 1);
        assert_eq!(ragdoll.joint_drives[2], 500.0);

        // 相同强度不再写入
        tracker.follow_joint(500.0, Quat::IDENTITY, &mut ragdoll);
        assert_eq!(ragdoll.drive_writes, 1);

        tracker.follow_joint(250.0, Quat::IDENTITY, &mut ragdoll);
        assert_eq!(ragdoll.drive_writes, 2);
    }

    #[test]
    fn test_zero_torque_skips_target() {
        let mut ragdoll = MockRagdoll::new();
        let mut tracker = tracker_for(2, &ragdoll);

        tracker.follow_joint(0.0, Quat::IDENTITY, &mut ragdoll);
        assert_eq!(ragdoll.joint_targets[2], None);

        tracker.follow_joint(100.0, Quat::IDENTITY, &mut ragdoll);
        assert!(ragdoll.joint_targets[2].is_some());
    }

    #[test]
    fn test_root_has_no_joint() {
        let mut ragdoll = MockRagdoll::new();
        let mut tracker = tracker_for(0, &ragdoll);

        tracker.follow_joint(100.0, Quat::IDENTITY, &mut ragdoll);
        assert_eq!(ragdoll.drive_writes, 0);
        assert_eq!(ragdoll.joint_targets[0], None);
    }
}
