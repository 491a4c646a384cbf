//! 远程配置变更事件定义

use serde::{Deserialize, Serialize};

/// 命名空间变更事件
///
/// 由远程客户端在检测到命名空间内容变化时传给更新回调。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceChangeEvent {
    /// 发生变化的命名空间
    pub namespace: String,
    /// 变更的键
    pub changes: Vec<KeyChange>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl NamespaceChangeEvent {
    /// 创建变更事件
    pub fn new(namespace: impl Into<String>, changes: Vec<KeyChange>) -> Self {
        Self {
            namespace: namespace.into(),
            changes,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 单个键的变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChange {
    /// 配置键
    pub key: String,
    /// 变更类型
    pub change_type: KeyChangeType,
}

impl KeyChange {
    /// 创建键变更
    pub fn new(key: impl Into<String>, change_type: KeyChangeType) -> Self {
        Self {
            key: key.into(),
            change_type,
        }
    }
}

/// 键变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyChangeType {
    /// 新增
    Added,
    /// 修改
    Modified,
    /// 删除
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_change_type() {
        let event = NamespaceChangeEvent::new(
            "default",
            vec![KeyChange::new("k", KeyChangeType::Deleted)],
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["changes"][0]["change_type"], "Deleted");
        assert_eq!(json["namespace"], "default");
    }
}
