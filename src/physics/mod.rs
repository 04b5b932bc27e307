//! 物理侧接口
//!
//! 控制器不绑定具体物理引擎，只依赖这里定义的窄接口：
//! 动画骨架数据源、物理骨架（刚体 + 关节）、地面射线检测。
//! 延迟物理指令队列也放在这里，因为它最终作用于物理骨架。

mod backend;
mod commands;

#[cfg(test)]
pub mod mock;

pub use backend::{AnimatedSkeleton, GetUpClip, GroundRaycast, PhysicalSkeleton, TeleportScope};
pub use commands::{BoneImpulse, DeferredPhysics};
