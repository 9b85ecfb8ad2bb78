//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为分帧、类型分派与值编解码的每一个失败点提供封闭的错误集合，调用方可据此精确判断流的状态；
//! - 每个错误都携带“失败前已提交/已消费的字节数”，以便上层做日志记录或流重同步。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 [`thiserror::Error`]，底层原因通过 `#[source]` 保留，错误链可逐级遍历；
//! - 错误码遵循 `<领域>.<语义>` 约定，集中定义在 [`codes`]；
//! - 编解码器本身从不重试、从不记录日志，错误一律立即返回。

use core::fmt;
use std::io;

use thiserror::Error;

use crate::dtm::Dtm;

/// 序列化器与解码策略返回的类型擦除错误。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 稳定错误码命名空间。
pub mod codes {
    /// 待编码值的具体类型未在编码注册表中登记。
    pub const UNRECOGNIZED_TYPE: &str = "codec.dtm.unrecognized_type";
    /// 写出 DTM 失败。
    pub const MARSHAL_DTM: &str = "codec.dtm.marshal_dtm_failed";
    /// 字节序列化器拒绝了待编码值。
    pub const MARSHAL_VALUE: &str = "codec.dtm.marshal_value_failed";
    /// 写出长度前缀字节序列失败。
    pub const MARSHAL_BYTE_SEQUENCE: &str = "codec.dtm.marshal_byte_sequence_failed";
    /// 读取 DTM 失败。
    pub const UNMARSHAL_DTM: &str = "codec.dtm.unmarshal_dtm_failed";
    /// 读到的 DTM 超出解码表范围。
    pub const UNRECOGNIZED_DTM: &str = "codec.dtm.unrecognized_dtm";
    /// 读取长度前缀字节序列失败。
    pub const UNMARSHAL_BYTE_SEQUENCE: &str = "codec.dtm.unmarshal_byte_sequence_failed";
    /// 解码策略未能还原值。
    pub const UNMARSHAL_VALUE: &str = "codec.dtm.unmarshal_value_failed";
}

/// 分帧原语（DTM 标记、varint、长度前缀字节序列）的失败。
///
/// `processed` 字段记录失败前已经写出或读入的字节数，调用方据此累计总字节量。
#[derive(Debug, Error)]
pub enum FramingError {
    /// 底层 sink/source 返回 I/O 错误；提前 EOF 以 [`io::ErrorKind::UnexpectedEof`] 表示。
    #[error("i/o failure after {processed} byte(s): {source}")]
    Io {
        processed: usize,
        #[source]
        source: io::Error,
    },

    /// varint 超出目标整数宽度。
    #[error("varint overflows its target width after {processed} byte(s)")]
    VarintOverflow { processed: usize },

    /// 长度前缀超出配置的上限。
    #[error("byte sequence length {len} exceeds limit {limit}")]
    LengthExceeded {
        processed: usize,
        len: u64,
        limit: usize,
    },
}

impl FramingError {
    pub(crate) fn io(processed: usize, source: io::Error) -> Self {
        FramingError::Io { processed, source }
    }

    /// 失败前已处理的字节数。
    pub fn processed(&self) -> usize {
        match self {
            FramingError::Io { processed, .. }
            | FramingError::VarintOverflow { processed }
            | FramingError::LengthExceeded { processed, .. } => *processed,
        }
    }
}

/// 错误的粗粒度分类，对应调用方的处置策略。
///
/// - `UnknownType`：未写出任何字节，流仍可继续使用，是否重试由调用方决定；
/// - `Io`：sink/source 本身失败，通常意味着连接已不可用；
/// - `Serialization`：值层面的编解码失败；
/// - `ProtocolDesync`：对端写出的 DTM 与本端解码表不一致，是协议失步信号。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    UnknownType,
    Io,
    Serialization,
    ProtocolDesync,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::UnknownType => "unknown_type",
            ErrorCategory::Io => "io",
            ErrorCategory::Serialization => "serialization",
            ErrorCategory::ProtocolDesync => "protocol_desync",
        })
    }
}

/// 编解码器对外暴露的封闭错误集合。
///
/// # 教案式说明
/// - **意图 (Why)**：编码、解码各四个失败点一一对应一个变体，调用方无需解析字符串即可判断失败阶段；
/// - **契约 (What)**：
///   - [`processed`](Self::processed) 返回失败前确切提交到 sink（编码）或从 source 消费（解码）的字节数；
///   - 写 DTM 被视为原子步骤，失败时报告 0 字节；读 DTM 失败同样报告 0 字节；
///   - 底层原因通过 `source()` 暴露，不做字符串化；
/// - **设计权衡 (Trade-offs)**：字节计数内嵌在变体里而非外包一层结构体，`match` 时可直接解构，
///   代价是每个变体都要重复声明 `processed` 字段。
#[derive(Debug, Error)]
pub enum CodecError {
    /// 待编码值的具体类型不在编码注册表中；此时尚未写出任何字节。
    #[error("unrecognized type: {type_name}")]
    UnrecognizedType { type_name: &'static str },

    /// 写出 DTM 失败。
    #[error("failed to marshal DTM: {source}")]
    FailedToMarshalDiscriminator {
        #[source]
        source: FramingError,
    },

    /// 字节序列化器拒绝了值；DTM 已经写出。
    #[error("failed to marshal {type_name} value: {source}")]
    FailedToMarshalValue {
        type_name: &'static str,
        processed: usize,
        #[source]
        source: BoxError,
    },

    /// 写出长度前缀字节序列失败。
    #[error("failed to marshal byte sequence: {source}")]
    FailedToMarshalByteSequence {
        processed: usize,
        #[source]
        source: FramingError,
    },

    /// 读取 DTM 失败。
    #[error("failed to unmarshal DTM: {source}")]
    FailedToUnmarshalDiscriminator {
        #[source]
        source: FramingError,
    },

    /// DTM 不在 `[0, table_len)` 范围内。
    #[error("unrecognized DTM: {dtm} (decode table holds {table_len} type(s))")]
    UnrecognizedDiscriminator {
        dtm: Dtm,
        table_len: usize,
        processed: usize,
    },

    /// 读取长度前缀字节序列失败。
    #[error("failed to unmarshal byte sequence: {source}")]
    FailedToUnmarshalByteSequence {
        processed: usize,
        #[source]
        source: FramingError,
    },

    /// 解码策略未能把负载还原为值。
    #[error("failed to unmarshal {type_name} value (DTM {dtm}): {source}")]
    FailedToUnmarshalValue {
        dtm: Dtm,
        type_name: &'static str,
        processed: usize,
        #[source]
        source: BoxError,
    },
}

impl CodecError {
    /// 失败前已写出（编码）或已读入（解码）的字节数。
    pub fn processed(&self) -> usize {
        match self {
            CodecError::UnrecognizedType { .. }
            | CodecError::FailedToMarshalDiscriminator { .. }
            | CodecError::FailedToUnmarshalDiscriminator { .. } => 0,
            CodecError::FailedToMarshalValue { processed, .. }
            | CodecError::FailedToMarshalByteSequence { processed, .. }
            | CodecError::UnrecognizedDiscriminator { processed, .. }
            | CodecError::FailedToUnmarshalByteSequence { processed, .. }
            | CodecError::FailedToUnmarshalValue { processed, .. } => *processed,
        }
    }

    /// 稳定错误码，取值见 [`codes`]。
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::UnrecognizedType { .. } => codes::UNRECOGNIZED_TYPE,
            CodecError::FailedToMarshalDiscriminator { .. } => codes::MARSHAL_DTM,
            CodecError::FailedToMarshalValue { .. } => codes::MARSHAL_VALUE,
            CodecError::FailedToMarshalByteSequence { .. } => codes::MARSHAL_BYTE_SEQUENCE,
            CodecError::FailedToUnmarshalDiscriminator { .. } => codes::UNMARSHAL_DTM,
            CodecError::UnrecognizedDiscriminator { .. } => codes::UNRECOGNIZED_DTM,
            CodecError::FailedToUnmarshalByteSequence { .. } => codes::UNMARSHAL_BYTE_SEQUENCE,
            CodecError::FailedToUnmarshalValue { .. } => codes::UNMARSHAL_VALUE,
        }
    }

    /// 错误分类。
    ///
    /// 分帧失败中只有 `LengthExceeded` 属于协议层问题，其余均归为 I/O。
    pub fn category(&self) -> ErrorCategory {
        match self {
            CodecError::UnrecognizedType { .. } => ErrorCategory::UnknownType,
            CodecError::FailedToMarshalValue { .. } | CodecError::FailedToUnmarshalValue { .. } => {
                ErrorCategory::Serialization
            }
            CodecError::UnrecognizedDiscriminator { .. } => ErrorCategory::ProtocolDesync,
            CodecError::FailedToMarshalDiscriminator { source }
            | CodecError::FailedToMarshalByteSequence { source, .. }
            | CodecError::FailedToUnmarshalDiscriminator { source }
            | CodecError::FailedToUnmarshalByteSequence { source, .. } => match source {
                FramingError::Io { .. } => ErrorCategory::Io,
                FramingError::VarintOverflow { .. } | FramingError::LengthExceeded { .. } => {
                    ErrorCategory::ProtocolDesync
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn every_framing_variant_reports_processed_bytes() {
        let io = FramingError::io(2, io::Error::other("boom"));
        let overflow = FramingError::VarintOverflow { processed: 5 };
        let exceeded = FramingError::LengthExceeded {
            processed: 1,
            len: 9,
            limit: 4,
        };
        assert_eq!(io.processed(), 2);
        assert_eq!(overflow.processed(), 5);
        assert_eq!(exceeded.processed(), 1);
        assert_eq!(exceeded.to_string(), "byte sequence length 9 exceeds limit 4");
    }

    #[test]
    fn codec_error_keeps_framing_cause_in_chain() {
        // Why: 调用方需要通过 `source()` 拿到底层 I/O 错误判断连接是否可用。
        let err = CodecError::FailedToMarshalByteSequence {
            processed: 1,
            source: FramingError::io(0, io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
        };
        let framing = err
            .source()
            .and_then(|s| s.downcast_ref::<FramingError>())
            .expect("framing error in chain");
        let io_err = framing
            .source()
            .and_then(|s| s.downcast_ref::<io::Error>())
            .expect("io error in chain");
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.code(), codes::MARSHAL_BYTE_SEQUENCE);
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn discriminator_steps_report_zero_bytes() {
        let marshal = CodecError::FailedToMarshalDiscriminator {
            source: FramingError::io(0, io::Error::other("w")),
        };
        let unmarshal = CodecError::FailedToUnmarshalDiscriminator {
            source: FramingError::VarintOverflow { processed: 5 },
        };
        assert_eq!(marshal.processed(), 0);
        assert_eq!(unmarshal.processed(), 0);
        assert_eq!(unmarshal.category(), ErrorCategory::ProtocolDesync);
    }

    #[test]
    fn unrecognized_dtm_message_names_table_length() {
        let err = CodecError::UnrecognizedDiscriminator {
            dtm: Dtm::new(99),
            table_len: 2,
            processed: 1,
        };
        assert_eq!(
            err.to_string(),
            "unrecognized DTM: 99 (decode table holds 2 type(s))"
        );
        assert_eq!(err.category(), ErrorCategory::ProtocolDesync);
    }
}
