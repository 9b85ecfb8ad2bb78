//! 编解码器配置。

use serde::{Deserialize, Serialize};

/// 编解码器的可调参数。
///
/// # 契约说明（What）
/// - `max_payload_len`：长度前缀字节序列的上限，写端与读端同时生效；`None` 表示不限制，
///   与未配置时的默认行为一致；
/// - 结构体可直接从 JSON/TOML 等配置源反序列化，缺省字段取默认值。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub max_payload_len: Option<usize>,
}

impl CodecConfig {
    /// 等同于 [`Default::default`]：不限制负载长度。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置负载长度上限。
    pub fn with_max_payload_len(mut self, limit: usize) -> Self {
        self.max_payload_len = Some(limit);
        self
    }
}
