//! 布娃娃运行时配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 每角色的行为参数在 [`crate::profile::ControllerProfile`] 里；
//! 这里只放跨角色共享的环境参数。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 运行时配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct SimConfig {
    // ========== 重力 ==========
    /// 重力 Y 分量（负数向下），默认 -9.81
    pub gravity_y: f32,

    // ========== 延迟物理 ==========
    /// 延迟物理指令队列上限，默认 32
    /// 捕获窗口只有一两帧，正常远用不满
    pub max_deferred_commands: usize,

    // ========== 调试 ==========
    /// 是否输出状态切换调试日志，默认 false
    pub debug_log: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // ====== 重力 ======
            // 标准重力；速度混合的"重力补偿"一步用它
            // 必须与物理后端的重力设置一致，否则低速骨骼下落速度不对
            gravity_y: -9.81,

            // ====== 延迟物理 ======
            max_deferred_commands: 32,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static SIM_CONFIG: Lazy<RwLock<SimConfig>> = Lazy::new(|| {
    RwLock::new(SimConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> SimConfig {
    SIM_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SimConfig) {
    *SIM_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *SIM_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = SimConfig::default();
}
