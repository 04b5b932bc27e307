//! 骨骼相关数学工具

use glam::{Mat3, Quat, Vec3};

/// 从前向与上向向量构造朝向旋转
///
/// forward 不要求归一化；与 up 共线或长度过小时返回单位旋转。
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let x = up.cross(z).normalize_or_zero();
    if x == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// 返回绝对值较大的那个数（保留符号）
#[inline]
pub fn max_abs(a: f32, b: f32) -> f32 {
    if a.abs() > b.abs() {
        a
    } else {
        b
    }
}

/// 逐分量取绝对值较大者（保留符号）
#[inline]
pub fn max_abs_vec3(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(max_abs(a.x, b.x), max_abs(a.y, b.y), max_abs(a.z, b.z))
}
