//! 错误类型
//!
//! 配置类错误（档案缺失/无效）在控制器构造时降级为惰性而不是 panic；
//! 运行时 API 对非法骨骼返回 `Err`，调用方决定忽略还是上报。

use thiserror::Error;

use crate::skeleton::BoneId;

/// 布娃娃控制错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RagdollError {
    /// 控制器没有档案（构造时未提供或校验失败）
    #[error("缺少控制器档案")]
    MissingProfile,

    /// 目标骨骼不在物理骨骼集合内
    #[error("骨骼 {0:?} 不是物理骨骼")]
    NotPhysicsBone(BoneId),

    /// 档案内容非法（骨骼数量、顺序、邻居表或时间参数）
    #[error("档案无效: {0}")]
    InvalidProfile(String),
}
