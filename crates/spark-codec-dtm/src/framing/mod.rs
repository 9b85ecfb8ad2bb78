//! 分帧原语：varint 与长度前缀字节序列。
//!
//! 两个子模块只依赖 [`crate::transport`] 的读写契约，所有函数都返回精确的字节计数，
//! 失败时计数记录在 [`crate::error::FramingError::processed`] 中。

pub mod byte_seq;
pub mod varint;
