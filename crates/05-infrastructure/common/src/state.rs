//! 变更监听状态

use serde::{Deserialize, Serialize};

/// 变更监听状态
///
/// `Disabled -> Closed` 与 `Enabled -> Closed` 是仅有的终止转换，`Closed` 之后不再变化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WatchState {
    /// 未启用监听
    Disabled = 0,
    /// 监听中
    Enabled = 1,
    /// 已关闭
    Closed = 2,
}

impl WatchState {
    /// 从原子存储的数值还原
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disabled,
            1 => Self::Enabled,
            _ => Self::Closed,
        }
    }

    /// 转换为原子存储的数值
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否已关闭
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl Default for WatchState {
    fn default() -> Self {
        Self::Disabled
    }
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
