//! 布娃娃混合引擎
//!
//! 在动画骨架（master）和物理骨架（ragdoll）之间做受控过渡：
//! 倒下时把动画速度灌进物理骨架并按衰减曲线逐渐放手，
//! 静止后自动起身并把物理姿态混合回动画。
//!
//! 核心模块：
//! - skeleton: 骨骼枚举、物理骨骼集合、旋转工具
//! - animation: 衰减曲线（归一化三次贝塞尔）
//! - profile: 控制器档案（全局增益 + 每骨骼参数 + 邻居表）
//! - physics: 骨架后端 trait 与延迟物理指令
//! - control: 状态机与每帧更新循环
//!
//! 引擎不依赖具体的动画/物理后端：调用方实现
//! [`physics::AnimatedSkeleton`] / [`physics::PhysicalSkeleton`] /
//! [`physics::GroundRaycast`] 三个 trait 即可接入。
//! 所有更新都显式传入步长，引擎内部没有时钟。

pub mod animation;
pub mod config;
pub mod control;
pub mod error;
pub mod physics;
pub mod profile;
pub mod skeleton;

pub use animation::{Curve, DecayCurve};
pub use config::{get_config, reset_config, set_config, SimConfig};
pub use control::{BoneDecayTable, RagdollBlendController, RagdollState, VelocityTracker};
pub use error::RagdollError;
pub use physics::{
    AnimatedSkeleton, BoneImpulse, GetUpClip, GroundRaycast, PhysicalSkeleton, TeleportScope,
};
pub use profile::{BoneProfile, ControllerProfile, FollowMode};
pub use skeleton::{BoneId, BoneTransform, PHYSICS_BONES, PHYSICS_BONE_COUNT};
