//! 衰减曲线
//!
//! 用三次贝塞尔曲线描述跟随强度随坠落进度的变化。
//! 构造时预计算采样点，求值只做排序查找加线性插值，避免每步解方程。
//!
//! 约定：输入 x 取 `1 - fallDecay`（曲线按坠落进度正向书写），
//! 输出在档案使用处再做 [0,1] 钳制。

use glam::Vec2;

/// 曲线 trait
pub trait Curve {
    fn value(&self, v: f32) -> f32;
}

/// 衰减曲线
///
/// 形状由归一化空间 (0,0)→(1,1) 的三次贝塞尔决定，
/// 输出再重映射到 [y_start, y_end]，因此可以表达 1→0 的跟随衰减。
#[derive(Debug, Clone, PartialEq)]
pub struct DecayCurve {
    /// 预计算的曲线采样点（归一化空间，按 X 排序）
    points: Vec<Vec2>,
    /// 控制点1
    c0: Vec2,
    /// 控制点2
    c1: Vec2,
    /// x=0 处输出
    y_start: f32,
    /// x=1 处输出
    y_end: f32,
}

impl DecayCurve {
    const P0: Vec2 = Vec2::ZERO;
    const P1: Vec2 = Vec2::ONE;

    /// 默认采样间隔数
    const DEFAULT_INTERVAL: u32 = 64;

    /// 创建新的衰减曲线
    ///
    /// # 参数
    /// - `y_start` / `y_end`: 曲线两端的输出值
    /// - `c0` / `c1`: 贝塞尔控制点（归一化到 0-1 范围）
    /// - `interval`: 采样间隔数
    pub fn new(y_start: f32, y_end: f32, c0: Vec2, c1: Vec2, interval: u32) -> Self {
        let interval = interval.max(1);
        let mut points = Vec::with_capacity((interval + 1) as usize);
        let interval_f = interval as f32;

        for i in 0..=interval {
            let t = i as f32 / interval_f;
            let it = 1.0 - t;
            // 三次贝塞尔曲线公式: B(t) = (1-t)³P₀ + 3(1-t)²tP₁ + 3(1-t)t²P₂ + t³P₃
            let point = Self::P0 * it.powi(3)
                + c0 * 3.0 * it.powi(2) * t
                + c1 * 3.0 * it * t.powi(2)
                + Self::P1 * t.powi(3);
            points.push(point);
        }

        // 按 X 排序以便查找
        points.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));

        Self {
            points,
            c0,
            c1,
            y_start,
            y_end,
        }
    }

    /// 1 → 0 的缓出衰减（跟随强度曲线的常用默认）
    pub fn fade_out() -> Self {
        Self::new(
            1.0,
            0.0,
            Vec2::new(0.42, 0.0),
            Vec2::new(1.0, 1.0),
            Self::DEFAULT_INTERVAL,
        )
    }

    /// 常数曲线
    pub fn constant(y: f32) -> Self {
        Self::new(
            y,
            y,
            Vec2::new(0.25, 0.25),
            Vec2::new(0.75, 0.75),
            Self::DEFAULT_INTERVAL,
        )
    }

    /// 线性曲线
    pub fn linear(y_start: f32, y_end: f32) -> Self {
        Self::new(
            y_start,
            y_end,
            Vec2::new(0.25, 0.25),
            Vec2::new(0.75, 0.75),
            Self::DEFAULT_INTERVAL,
        )
    }

    /// 归一化空间下的曲线值（排序采样点线性插值查找）
    fn normalized_value(&self, v: f32) -> f32 {
        let mut n = (self.points[0], self.points[1]);
        for point in &self.points[2..] {
            if n.1.x > v {
                break;
            }
            n = (n.1, *point);
        }
        if n.0.x == n.1.x {
            n.0.y
        } else {
            n.0.y + (v - n.0.x) * (n.1.y - n.0.y) / (n.1.x - n.0.x)
        }
    }
}

impl Curve for DecayCurve {
    /// 根据输入值计算曲线输出值
    fn value(&self, v: f32) -> f32 {
        let t = self.normalized_value(v.clamp(0.0, 1.0));
        self.y_start + (self.y_end - self.y_start) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = DecayCurve::linear(0.0, 1.0);

        // 线性曲线应该近似 y = x
        assert!((curve.value(0.0) - 0.0).abs() < 0.01);
        assert!((curve.value(0.5) - 0.5).abs() < 0.05);
        assert!((curve.value(1.0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_fade_out_endpoints() {
        let curve = DecayCurve::fade_out();
        assert!((curve.value(0.0) - 1.0).abs() < 0.01);
        assert!((curve.value(1.0) - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_fade_out_monotonic() {
        // 跟随强度随坠落进度只降不升
        let curve = DecayCurve::fade_out();
        let mut last = curve.value(0.0);
        for i in 1..=20 {
            let v = curve.value(i as f32 / 20.0);
            assert!(v <= last + 1e-4, "曲线在 {} 处回升", i);
            last = v;
        }
    }

    #[test]
    fn test_constant_curve() {
        let curve = DecayCurve::constant(0.6);
        assert!((curve.value(0.0) - 0.6).abs() < 1e-4);
        assert!((curve.value(0.37) - 0.6).abs() < 1e-4);
        assert!((curve.value(1.0) - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_input_clamped() {
        // 越界输入钳制到端点
        let curve = DecayCurve::fade_out();
        assert_eq!(curve.value(-1.0), curve.value(0.0));
        assert_eq!(curve.value(2.0), curve.value(1.0));
    }
}
