//! 动画侧工具
//!
//! 目前只有衰减曲线：档案中每根骨骼的跟随强度随坠落进度变化的采样曲线。

mod decay_curve;

pub use decay_curve::{Curve, DecayCurve};
