//! 控制核心
//!
//! 动画控制与物理控制之间的过渡全在这里：
//! - VelocityTracker: 有限差分估计动画骨骼速度
//! - PhysicalBoneTracker: 每骨骼 PD 跟随力 + 关节目标
//! - BoneDecayTable: 每骨骼的跟随抑制（冲击响应）
//! - RagdollBlendController: 状态机与每帧更新循环

mod bone_decay;
mod bone_tracker;
mod controller;
mod velocity_tracker;

pub use bone_decay::BoneDecayTable;
pub use bone_tracker::PhysicalBoneTracker;
pub use controller::{RagdollBlendController, RagdollState};
pub use velocity_tracker::VelocityTracker;
