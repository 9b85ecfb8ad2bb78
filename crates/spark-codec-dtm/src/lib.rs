//! # spark-codec-dtm
//!
//! ## 教案意图（Why）
//! - **职责定位**：让传输层在不知道具体类型的前提下，在同一条字节流上收发一组封闭的业务类型；
//! - **核心手法**：每个负载前写一个数据类型标记（DTM），读端据此还原具体类型后再交给该类型的
//!   反序列化逻辑；
//! - **可替换点**：字节序列化器与解码策略均由调用方注入，本 crate 只负责类型分派与分帧。
//!
//! ## 线上格式（What）
//! ```text
//! +-------------+------------------+-----------------+
//! | varint(DTM) | varint(len)      | payload (len B) |
//! +-------------+------------------+-----------------+
//! ```
//! - DTM 与长度均为无符号 LEB128 varint，128 以内各占 1 字节；
//! - 负载由 [`Serializer`] 产出，本层不解析其内容。
//!
//! ## 使用方式（How）
//! ```
//! use std::sync::Arc;
//!
//! use serde::{Deserialize, Serialize};
//! use spark_codec_dtm::{
//!     Codec, DecodeTable, EncodeRegistry, JsonSerializer, TypeKey, WireType, json_frame,
//! };
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Alpha { id: u32 }
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Beta { field: String }
//!
//! #[derive(Debug, PartialEq)]
//! enum Message { Alpha(Alpha), Beta(Beta) }
//!
//! impl From<Alpha> for Message { fn from(v: Alpha) -> Self { Message::Alpha(v) } }
//! impl From<Beta> for Message { fn from(v: Beta) -> Self { Message::Beta(v) } }
//!
//! impl WireType for Message {
//!     fn type_key(&self) -> TypeKey {
//!         match self {
//!             Message::Alpha(_) => TypeKey::of::<Alpha>(),
//!             Message::Beta(_) => TypeKey::of::<Beta>(),
//!         }
//!     }
//! }
//!
//! // 负载只含变体内部的具体值，变体由 DTM 决定。
//! json_frame!(Message { Alpha, Beta });
//!
//! let codec: Codec<Message, Message, JsonSerializer> = Codec::new(
//!     EncodeRegistry::new([TypeKey::of::<Alpha>(), TypeKey::of::<Beta>()]),
//!     DecodeTable::builder().register::<Alpha>().register::<Beta>().build(),
//!     Arc::new(JsonSerializer),
//! );
//!
//! let mut wire = Vec::new();
//! let written = codec.encode(&Message::Beta(Beta { field: "x".into() }), &mut wire)?;
//! assert_eq!(wire[0], 1);
//! assert_eq!(&wire[2..], br#"{"field":"x"}"#);
//!
//! let (value, read) = codec.decode(&mut wire.as_slice())?;
//! assert_eq!(value, Message::Beta(Beta { field: "x".into() }));
//! assert_eq!(read, written);
//! # Ok::<(), spark_codec_dtm::CodecError>(())
//! ```
//!
//! ## 风险提示（Trade-offs）
//! - 编码注册表与解码表独立构建且不做交叉校验，以支持非对称的编码域/解码域；
//!   通信双方对 DTM 的一致理解由调用方保证；
//! - 本层无缓冲、无重试；I/O 错误原样向上传递，连接是否仍可用由调用方判断。

mod codec;
mod config;
mod decode;
pub mod dtm;
pub mod error;
pub mod framing;
mod registry;
mod serializer;
pub mod transport;

pub use codec::Codec;
pub use config::CodecConfig;
pub use decode::{ConstructThenUnmarshal, DecodeFn, DecodeValue, decode_fn};
pub use dtm::Dtm;
pub use error::{BoxError, CodecError, ErrorCategory, FramingError};
pub use registry::{DecodeSlot, DecodeTable, DecodeTableBuilder, EncodeRegistry, TypeKey, WireType};
#[cfg(feature = "json")]
pub use serializer::{JsonFrame, JsonSerializer};
pub use serializer::{Marshal, Serializer, Unmarshal};
pub use transport::{ByteSink, ByteSource, IoSink, IoSource};

#[cfg(feature = "json")]
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
