//! 布娃娃混合控制器
//!
//! 驱动动画控制与物理控制之间过渡的状态机：
//!
//! ```text
//! Animated → CalculateAnimationVelocity → Falling → Ragdolled
//!     ↑                                                  ↓
//! BlendToAnimated ← TeleportMasterToRagdoll ← (起身判定)
//! ```
//!
//! 时序模型：每帧先由调用方完成动画姿态求值，再调用 [`RagdollBlendController::update`]
//! （姿态阶段）；每个固定物理步调用 [`RagdollBlendController::fixed_update`]（物理阶段）。
//! 没有环境时钟，所有时间都由调用方传入的步长累计。

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::Curve;
use crate::config::get_config;
use crate::error::RagdollError;
use crate::physics::{
    AnimatedSkeleton, BoneImpulse, DeferredPhysics, GetUpClip, GroundRaycast, PhysicalSkeleton,
    TeleportScope,
};
use crate::profile::{ControllerProfile, FollowMode};
use crate::skeleton::{max_abs_vec3, BoneId, PHYSICS_BONES};

use super::bone_decay::BoneDecayTable;
use super::bone_tracker::PhysicalBoneTracker;
use super::velocity_tracker::VelocityTracker;

// ============================================================================
// 状态
// ============================================================================

/// 控制器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RagdollState {
    /// 动画完全控制，物理骨架运动学跟随
    Animated,
    /// 正在捕获动画速度（物理还未接管）
    CalculateAnimationVelocity,
    /// 物理接管，按衰减继续追动画
    Falling,
    /// 完全物理控制
    Ragdolled,
    /// 等待起身动画过渡，然后把动画根对象对齐到布娃娃
    TeleportMasterToRagdoll,
    /// 物理姿态混合回动画姿态
    BlendToAnimated,
}

/// 坠落衰减的零判定阈值
const EPSILON: f32 = 1e-4;

/// 起身后仍视为"正在起身"的时长（秒）
const GETUP_TIME: f32 = 2.5;

/// 起身落地射线的探测距离
const GROUND_PROBE_DISTANCE: f32 = 5.0;

/// 捕获动画速度所需的完整采样帧数
const VELOCITY_CAPTURE_FRAMES: u32 = 1;

/// 世界前向
const FORWARD: Vec3 = Vec3::Z;

// ============================================================================
// 控制器
// ============================================================================

/// 布娃娃混合控制器
///
/// 构造时缺少或校验失败的档案不会 panic：控制器记一条警告后永久保持惰性，
/// 所有公共调用降级为空操作（缺配置的角色不能拖垮帧循环）。
pub struct RagdollBlendController {
    /// 档案（None 表示惰性）
    profile: Option<Arc<ControllerProfile>>,

    state: RagdollState,
    /// 当前状态持续时间（由调用方传入的帧步长累计）
    state_time: f32,

    /// 不再起身（"死亡"），只抑制静止判定
    disable_get_up: bool,

    /// 全局坠落衰减，1 → 0
    fall_decay: f32,
    /// 坠落衰减速度覆盖（None 用档案默认，起身时清除）
    fall_speed: Option<f32>,

    bone_decays: BoneDecayTable,
    trackers: Vec<PhysicalBoneTracker>,
    velocity_trackers: Vec<VelocityTracker>,
    deferred: DeferredPhysics,

    /// 已累计的速度捕获帧数
    velocity_capture_frames: u32,

    /// 根骨骼相对角色根对象前向的旋转
    rootbone_to_forward: Quat,
    forward_calc_frames: u8,
    forward_calculated: bool,
}

impl RagdollBlendController {
    /// 创建控制器
    ///
    /// 需要已经建好的骨架对；跟踪器在这里一次性初始化（关节基变换、质心偏移），
    /// 之后骨架对不允许增删骨骼。物理骨架随即被置为运动学模式。
    pub fn new<P: PhysicalSkeleton>(
        profile: Option<Arc<ControllerProfile>>,
        ragdoll: &mut P,
    ) -> Self {
        let profile = match profile {
            Some(p) => match p.validate() {
                Ok(()) => Some(p),
                Err(e) => {
                    log::warn!("[Ragdoll] {}，控制器保持惰性", e);
                    None
                }
            },
            None => {
                log::warn!("[Ragdoll] {}", RagdollError::MissingProfile);
                None
            }
        };

        let (trackers, velocity_trackers) = if profile.is_some() {
            let trackers: Vec<PhysicalBoneTracker> = PHYSICS_BONES
                .iter()
                .enumerate()
                .map(|(i, bone)| PhysicalBoneTracker::new(*bone, i, ragdoll))
                .collect();
            // 速度跟踪器跟踪动画骨骼上与刚体质心相同的点
            let velocity_trackers = trackers
                .iter()
                .map(|t| VelocityTracker::new(t.mass_center_offset()))
                .collect();
            ragdoll.set_kinematic(true);
            (trackers, velocity_trackers)
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            profile,
            state: RagdollState::Animated,
            // 初始不算"刚起身"
            state_time: f32::INFINITY,
            disable_get_up: false,
            fall_decay: 0.0,
            fall_speed: None,
            bone_decays: BoneDecayTable::new(),
            trackers,
            velocity_trackers,
            deferred: DeferredPhysics::new(),
            velocity_capture_frames: 0,
            rootbone_to_forward: Quat::IDENTITY,
            forward_calc_frames: 0,
            forward_calculated: false,
        }
    }

    // ========================================
    // 只读接口
    // ========================================

    #[inline]
    pub fn state(&self) -> RagdollState {
        self.state
    }

    /// 控制器是否可用（档案缺失/无效时为 false）
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.profile.is_some()
    }

    /// 是否刚完成起身（回到 Animated 后的一小段时间内为 true）
    #[inline]
    pub fn is_getting_up(&self) -> bool {
        self.state == RagdollState::Animated && self.state_time < GETUP_TIME
    }

    /// 布娃娃骨架当前是否应当可见
    #[inline]
    pub fn ragdoll_renderers_enabled(&self) -> bool {
        !matches!(
            self.state,
            RagdollState::Animated | RagdollState::CalculateAnimationVelocity
        )
    }

    /// 当前全局坠落衰减
    #[inline]
    pub fn fall_decay(&self) -> f32 {
        self.fall_decay
    }

    /// 读取骨骼的手动衰减（非物理骨骼返回 None）
    pub fn bone_decay(&self, bone: BoneId) -> Option<f32> {
        self.bone_decays.decay(bone)
    }

    /// 读取跟踪器（按物理骨骼下标），用于调 runtime_multiplier 等
    pub fn tracker_mut(&mut self, index: usize) -> Option<&mut PhysicalBoneTracker> {
        self.trackers.get_mut(index)
    }

    // ========================================
    // 公共控制接口
    // ========================================

    /// 覆盖本次坠落的衰减速度（起身时自动清除，之后回到档案默认）
    pub fn set_fall_speed(&mut self, speed: f32) {
        self.fall_speed = Some(speed);
    }

    /// 永久禁止起身（静止判定不再触发）
    pub fn set_disable_get_up(&mut self, disable: bool) {
        self.disable_get_up = disable;
    }

    /// 设置骨骼衰减（见 [`BoneDecayTable::set_decay`]）
    pub fn set_bone_decay(
        &mut self,
        bone: BoneId,
        value: f32,
        neighbor_value: f32,
    ) -> Result<(), RagdollError> {
        let Some(profile) = self.profile.clone() else {
            return Err(RagdollError::MissingProfile);
        };
        self.bone_decays.set_decay(&profile, bone, value, neighbor_value)
    }

    /// 暂存一条物理指令，物理接管后的第一个物理步执行
    pub fn store_physics(&mut self, command: BoneImpulse) {
        if self.profile.is_none() {
            return;
        }
        self.deferred.store(command);
    }

    /// 触发布娃娃过程
    ///
    /// 已经在过渡或已倒下时（CalculateAnimationVelocity / Falling / Ragdolled）
    /// 是空操作。否则以当前动画姿态为基线开始捕获动画速度。
    pub fn go_ragdoll<A: AnimatedSkeleton>(&mut self, master: &A) {
        if self.profile.is_none() {
            log::warn!("[Ragdoll] 控制器惰性，忽略 go_ragdoll");
            return;
        }

        if matches!(
            self.state,
            RagdollState::CalculateAnimationVelocity
                | RagdollState::Falling
                | RagdollState::Ragdolled
        ) {
            return;
        }

        // 以当前姿态为基线，下一帧差分出动画速度
        for (tracker, bone) in self.velocity_trackers.iter_mut().zip(PHYSICS_BONES) {
            tracker.reset(master.bone_position(bone), master.bone_rotation(bone));
        }
        self.velocity_capture_frames = 0;

        self.change_state(RagdollState::CalculateAnimationVelocity);
    }

    // ========================================
    // 每帧更新（姿态阶段）
    // ========================================

    /// 姿态阶段更新，动画姿态求值完成后每帧调用一次
    pub fn update<A, P, G>(&mut self, delta_time: f32, master: &mut A, ragdoll: &mut P, ground: &G)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
        G: GroundRaycast,
    {
        let Some(profile) = self.profile.clone() else {
            return;
        };
        if delta_time <= 0.0 {
            return;
        }

        self.initialize_forward_calculation(master);
        self.state_time += delta_time;

        match self.state {
            RagdollState::Animated => {}
            RagdollState::Falling => {
                self.handle_fall_lerp(&profile, delta_time);
            }
            RagdollState::TeleportMasterToRagdoll => {
                // 等起身动画过渡到躺姿
                if self.state_time >= profile.orientate_delay {
                    self.teleport_master_to_ragdoll(&profile, master, ragdoll, ground);
                }
            }
            RagdollState::BlendToAnimated => {
                let blend = (self.state_time / profile.blend_time).clamp(0.0, 1.0);
                ragdoll.load_snapshot(1.0 - blend, master);
                if blend >= 1.0 {
                    self.reset_to_animated(master, ragdoll);
                }
            }
            _ => {}
        }

        // 速度采样与捕获推进
        if matches!(
            self.state,
            RagdollState::CalculateAnimationVelocity | RagdollState::Falling
        ) {
            self.calculate_animation_velocities(delta_time, master);

            if self.state == RagdollState::CalculateAnimationVelocity {
                self.velocity_capture_frames += 1;
                if self.velocity_capture_frames >= VELOCITY_CAPTURE_FRAMES {
                    self.velocity_capture_frames = 0;
                    self.start_fall(master, ragdoll);
                }
            }
        }
    }

    // ========================================
    // 物理步更新
    // ========================================

    /// 物理阶段更新，每个固定物理步调用一次
    pub fn fixed_update<A, P>(&mut self, fixed_delta_time: f32, master: &mut A, ragdoll: &mut P)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        let Some(profile) = self.profile.clone() else {
            return;
        };
        if fixed_delta_time <= 0.0 {
            return;
        }

        // 物理已接管时先执行暂存的物理指令（恰好一次，队列空则是空操作）
        if matches!(self.state, RagdollState::Falling | RagdollState::Ragdolled) {
            self.deferred.drain(ragdoll);
        }

        match self.state {
            RagdollState::Animated => {
                // 运动学模式下把物理骨架钉在动画姿态上（含父层级，骨架不可见也能被命中）
                ragdoll.teleport_to_master(
                    TeleportScope::PHYSICS_BONES | TeleportScope::PARENTS,
                    master,
                );
            }
            RagdollState::Falling => {
                self.set_physics_velocities(&profile, fixed_delta_time, master, ragdoll);
            }
            RagdollState::Ragdolled => {
                if !self.disable_get_up {
                    self.check_for_get_up(&profile, master, ragdoll);
                }
            }
            _ => {}
        }
    }

    // ========================================
    // 状态切换
    // ========================================

    fn change_state(&mut self, new_state: RagdollState) {
        if get_config().debug_log {
            log::debug!("[Ragdoll] 状态切换: {:?} → {:?}", self.state, new_state);
        }
        self.state = new_state;
        self.state_time = 0.0;
    }

    /// 物理实际接管的瞬间
    fn start_fall<A, P>(&mut self, master: &mut A, ragdoll: &mut P)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        self.fall_decay = 1.0;

        // 整体传送到动画姿态，再放开物理
        ragdoll.teleport_to_master(TeleportScope::ALL, master);
        ragdoll.set_kinematic(false);

        // 可见骨架切换为布娃娃；动画骨架隐藏但必须继续全帧率求值
        master.set_renderers_enabled(false);
        ragdoll.set_renderers_enabled(true);
        master.set_always_animate(true);

        self.change_state(RagdollState::Falling);
    }

    /// 坠落衰减缓动
    fn handle_fall_lerp(&mut self, profile: &ControllerProfile, delta_time: f32) {
        let speed =
            (self.fall_speed.unwrap_or(profile.fall_decay_speed) * delta_time).clamp(0.0, 1.0);

        if self.fall_decay != 0.0 {
            self.fall_decay += (0.0 - self.fall_decay) * speed;
            if self.fall_decay <= EPSILON {
                self.fall_decay = 0.0;
            }
        }
    }

    /// 采样每根骨骼的动画速度（姿态阶段）
    fn calculate_animation_velocities<A: AnimatedSkeleton>(
        &mut self,
        delta_time: f32,
        master: &A,
    ) {
        let reci_delta_time = 1.0 / delta_time;
        for (tracker, bone) in self.velocity_trackers.iter_mut().zip(PHYSICS_BONES) {
            tracker.track(
                master.bone_position(bone),
                master.bone_rotation(bone),
                reci_delta_time,
                false,
            );
        }
    }

    /// 坠落期间的每骨骼速度/力混合（物理步）
    fn set_physics_velocities<A, P>(
        &mut self,
        profile: &ControllerProfile,
        fixed_delta_time: f32,
        master: &A,
        ragdoll: &mut P,
    ) where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        let max_gravity_add_velocity2 =
            profile.max_gravity_add_velocity * profile.max_gravity_add_velocity;
        let gravity_y = get_config().gravity_y;
        let reci_delta_time = 1.0 / fixed_delta_time;

        // 曲线按坠落进度正向书写，采样点是 1 - fallDecay
        let curve_sample = 1.0 - self.fall_decay;

        for (i, bone) in PHYSICS_BONES.iter().enumerate() {
            let bone = *bone;
            let bone_profile = &profile.bones[i];

            let body_velocity = ragdoll.linear_velocity(bone);
            let manual_decay = self.bone_decays.get(i);

            let force_decay = (bone_profile.fall_force_decay.value(curve_sample).clamp(0.0, 1.0)
                - manual_decay)
                .clamp(0.0, 1.0);

            // 还有跟随力剩余才做追踪
            if force_decay != 0.0 {
                match profile.follow_mode {
                    FollowMode::VelocitySet => {
                        let mut target_velocity = self.velocity_trackers[i].velocity();

                        // 静止动画会把骨骼顶在空中，给低速目标补一步重力
                        if target_velocity.length_squared() < max_gravity_add_velocity2 {
                            target_velocity.y = gravity_y * fixed_delta_time;
                        }

                        // 手动衰减说明有外部速度要保留：逐分量取较大者
                        if manual_decay != 0.0 {
                            target_velocity = max_abs_vec3(body_velocity, target_velocity);
                        }

                        ragdoll.set_linear_velocity(
                            bone,
                            body_velocity.lerp(target_velocity, force_decay),
                        );
                    }
                    FollowMode::PdController => {
                        self.trackers[i].apply_follow_force(
                            profile,
                            bone_profile,
                            profile.max_force * force_decay,
                            reci_delta_time,
                            master,
                            ragdoll,
                        );
                    }
                }
            }

            // 根骨骼没有关节
            if i != 0 {
                let torque_decay = (bone_profile
                    .fall_torque_decay
                    .value(curve_sample)
                    .clamp(0.0, 1.0)
                    - manual_decay)
                    .clamp(0.0, 1.0);

                let torque = profile.max_torque
                    * torque_decay
                    * bone_profile.max_torque
                    * self.trackers[i].runtime_multiplier;

                self.trackers[i].follow_joint(torque, master.bone_local_rotation(bone), ragdoll);
            }
        }

        // 所有骨骼处理完、各组件都已落到 0 值之后再切状态
        if self.fall_decay == 0.0 {
            self.change_state(RagdollState::Ragdolled);
        }
    }

    /// 静止判定：倒够最短时长且根骨骼基本不动才起身
    fn check_for_get_up<A, P>(&mut self, profile: &ControllerProfile, master: &mut A, ragdoll: &mut P)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        if self.state_time <= profile.ragdoll_min_time {
            return;
        }
        let settled2 = profile.settled_speed * profile.settled_speed;
        if ragdoll.linear_velocity(BoneId::Hips).length_squared() < settled2 {
            self.start_get_up(master, ragdoll);
        }
    }

    /// 开始起身
    fn start_get_up<A, P>(&mut self, master: &mut A, ragdoll: &mut P)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        // 下一次布娃娃过程从干净的衰减表开始
        self.bone_decays.reset_all();
        self.fall_speed = None;

        // 冻结物理姿态并留快照
        ragdoll.set_kinematic(true);
        ragdoll.save_snapshot();

        // 根据倒地朝向选起身动画
        let hips_forward = ragdoll.body_rotation(BoneId::Hips) * self.rootbone_to_forward * FORWARD;
        let on_back = hips_forward.dot(Vec3::NEG_Y) < 0.0;
        master.play_clip(if on_back {
            GetUpClip::FromBack
        } else {
            GetUpClip::FromFront
        });

        self.change_state(RagdollState::TeleportMasterToRagdoll);
    }

    /// 把动画根对象对齐到布娃娃的落点（只保留偏航）
    fn teleport_master_to_ragdoll<A, P, G>(
        &mut self,
        profile: &ControllerProfile,
        master: &mut A,
        ragdoll: &mut P,
        ground: &G,
    ) where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
        G: GroundRaycast,
    {
        let hips_rotation = ragdoll.body_rotation(BoneId::Hips);
        let master_hips_rotation = master.bone_rotation(BoneId::Hips);

        let mut rotation = hips_rotation * master_hips_rotation.inverse() * master.root_rotation();

        // 压平前向，只保留偏航
        let mut forward = rotation * FORWARD;
        forward.y = 0.0;
        if forward.length_squared() > 1e-8 {
            rotation = crate::skeleton::look_rotation(forward, Vec3::Y);
        } else {
            rotation = master.root_rotation();
        }

        let mut position =
            master.root_position() + (ragdoll.body_position(BoneId::Hips) - master.bone_position(BoneId::Hips));

        // 从落点上方往下找地面吸附高度；找不到就保持原高度
        if let Some(hit) = ground.raycast_down(
            position + Vec3::Y,
            GROUND_PROBE_DISTANCE,
            profile.check_ground_mask,
        ) {
            position.y = hit.y;
        }

        // 位置与旋转一并生效，再推进状态
        master.set_root_transform(position, rotation);

        self.change_state(RagdollState::BlendToAnimated);
    }

    /// 回到动画控制
    fn reset_to_animated<A, P>(&mut self, master: &mut A, ragdoll: &mut P)
    where
        A: AnimatedSkeleton,
        P: PhysicalSkeleton,
    {
        master.set_always_animate(false);
        master.set_renderers_enabled(true);
        ragdoll.set_renderers_enabled(false);

        self.change_state(RagdollState::Animated);
    }

    /// 根骨骼前向基准的延迟初始化
    ///
    /// 某些模型最初几帧姿态未稳定，固定等到第三个姿态帧再算。
    fn initialize_forward_calculation<A: AnimatedSkeleton>(&mut self, master: &A) {
        if self.forward_calculated {
            return;
        }
        if self.forward_calc_frames == 2 {
            self.rootbone_to_forward =
                master.bone_rotation(BoneId::Hips).inverse() * master.root_rotation();
            self.forward_calculated = true;
        }
        self.forward_calc_frames += 1;
    }
}

// ============================================================================
// 测试
// ============================================================================
