//! 速度跟踪器
//!
//! 对动画骨骼位置做有限差分，得到要灌给物理骨架的瞬时速度。
//! reset 会把当前位置记为基线：同一帧内再采样得到的速度恰好为零，
//! 避免状态切换瞬间出现速度尖峰。

use glam::{Quat, Vec3};

/// 速度跟踪器
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    /// 跟踪点在骨骼本地空间的偏移（通常是刚体质心偏移）
    local_offset: Vec3,
    last_position: Option<Vec3>,
    last_rotation: Option<Quat>,
    velocity: Vec3,
    angular_velocity: Vec3,
}

impl VelocityTracker {
    pub fn new(local_offset: Vec3) -> Self {
        Self {
            local_offset,
            last_position: None,
            last_rotation: None,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    /// 跟踪点的世界位置
    #[inline]
    fn world_point(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation * self.local_offset
    }

    /// 以当前姿态为基线重置
    ///
    /// 重置后下一次采样得到的是相对此刻的真实位移速度；
    /// 同一帧内立即采样则为零。
    pub fn reset(&mut self, position: Vec3, rotation: Quat) {
        self.last_position = Some(self.world_point(position, rotation));
        self.last_rotation = Some(rotation);
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// 采样一帧
    ///
    /// `reci_delta_time` 必须来自一个已知非零的 delta time。
    /// 没有基线时（从未 reset 过）速度为零，不会产生垃圾值。
    pub fn track(&mut self, position: Vec3, rotation: Quat, reci_delta_time: f32, use_rotation: bool) {
        let point = self.world_point(position, rotation);

        self.velocity = match self.last_position {
            Some(last) => (point - last) * reci_delta_time,
            None => Vec3::ZERO,
        };
        self.last_position = Some(point);

        if use_rotation {
            self.angular_velocity = match self.last_rotation {
                Some(last) => {
                    let delta = rotation * last.inverse();
                    let (axis, mut angle) = delta.to_axis_angle();
                    // 取最短旋转弧
                    if angle > std::f32::consts::PI {
                        angle -= std::f32::consts::TAU;
                    }
                    axis * angle * reci_delta_time
                }
                None => Vec3::ZERO,
            };
            self.last_rotation = Some(rotation);
        }
    }

    /// 最近一次采样的线速度
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// 最近一次采样的角速度（仅在 use_rotation 采样后有效）
    #[inline]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }
}
