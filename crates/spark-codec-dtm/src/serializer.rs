//! 字节序列化器契约。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 编解码器只负责“类型标识 + 分帧”，值本身如何变成字节由调用方注入的序列化器决定；
//! - 编码方向与解码方向拆成 [`Marshal`] 与 [`Unmarshal`] 两个 trait：解码策略只需要
//!   后者，拆开后策略实现不必对编码域类型做任何约束。
//!
//! ## 契约说明（What）
//! - `marshal` 把编码域的值转成完整负载；
//! - `unmarshal` 接收由解码表构造好的空白实例，原地填充；实例的具体类型（枚举则为变体）
//!   由 DTM 决定，序列化器只填充内容，不得改换类型；
//! - 序列化器由外部持有，编解码器只通过共享引用调用，要求 `Send + Sync`。

use bytes::Bytes;

/// 编码方向：值 → 字节。
pub trait Marshal<E: ?Sized>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn marshal(&self, value: &E) -> Result<Bytes, Self::Error>;
}

/// 解码方向：字节 → 原地填充目标实例。
pub trait Unmarshal<D>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn unmarshal(&self, bytes: &[u8], target: &mut D) -> Result<(), Self::Error>;
}

/// 同时具备双向能力的序列化器。
pub trait Serializer<E: ?Sized, D>: Marshal<E> + Unmarshal<D> {}

impl<E: ?Sized, D, S> Serializer<E, D> for S where S: Marshal<E> + Unmarshal<D> {}

#[cfg(feature = "json")]
pub use json::{JsonFrame, JsonSerializer};

#[cfg(feature = "json")]
mod json {
    use bytes::Bytes;

    use super::{Marshal, Unmarshal};

    /// 以具体类型收发 JSON 的值。
    ///
    /// # 设计初衷（Why）
    /// - DTM 已经标识了具体类型，负载里不应再出现第二份类型标签；否则读端会按负载里的标签
    ///   而不是 DTM 选择类型，两者不一致时静默解出错误的类型。
    ///
    /// # 契约说明（What）
    /// - `write_json`：只序列化当前承载的具体值；对枚举而言是变体内部的值，不含变体名；
    /// - `read_json`：按当前承载值的具体类型反序列化 `bytes` 并原地替换，枚举变体保持不变；
    ///   于是解码出的类型完全由解码表为该 DTM 构造的空白实例决定；
    /// - 通常用 [`json_frame!`](crate::json_frame) 生成实现。
    pub trait JsonFrame {
        fn write_json(&self) -> serde_json::Result<Vec<u8>>;

        fn read_json(&mut self, bytes: &[u8]) -> serde_json::Result<()>;
    }

    /// 为枚举或普通结构体生成 [`JsonFrame`] 实现。
    ///
    /// - `json_frame!(Message { Alpha, Beta })`：枚举形式，列出全部单字段元组变体；
    /// - `json_frame!(Ping, Pong)`：普通类型，直接以自身收发。
    ///
    /// ```
    /// use serde::{Deserialize, Serialize};
    /// use spark_codec_dtm::{JsonFrame, json_frame};
    ///
    /// #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    /// struct Alpha { id: u32 }
    /// #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    /// struct Beta { field: String }
    ///
    /// #[derive(Debug, PartialEq)]
    /// enum Message { Alpha(Alpha), Beta(Beta) }
    /// json_frame!(Message { Alpha, Beta });
    ///
    /// let beta = Message::Beta(Beta { field: "x".into() });
    /// assert_eq!(beta.write_json().unwrap(), br#"{"field":"x"}"#);
    ///
    /// let mut slot = Message::Alpha(Alpha::default());
    /// slot.read_json(br#"{"id":7}"#).unwrap();
    /// assert_eq!(slot, Message::Alpha(Alpha { id: 7 }));
    /// ```
    #[macro_export]
    macro_rules! json_frame {
        ($ty:ident { $($variant:ident),+ $(,)? }) => {
            impl $crate::JsonFrame for $ty {
                fn write_json(&self) -> $crate::__private::serde_json::Result<::std::vec::Vec<u8>> {
                    match self {
                        $( $ty::$variant(value) => $crate::__private::serde_json::to_vec(value), )+
                    }
                }

                fn read_json(&mut self, bytes: &[u8]) -> $crate::__private::serde_json::Result<()> {
                    match self {
                        $(
                            $ty::$variant(value) => {
                                *value = $crate::__private::serde_json::from_slice(bytes)?;
                                ::core::result::Result::Ok(())
                            }
                        )+
                    }
                }
            }
        };
        ($($ty:ty),+ $(,)?) => {
            $(
                impl $crate::JsonFrame for $ty {
                    fn write_json(&self) -> $crate::__private::serde_json::Result<::std::vec::Vec<u8>> {
                        $crate::__private::serde_json::to_vec(self)
                    }

                    fn read_json(&mut self, bytes: &[u8]) -> $crate::__private::serde_json::Result<()> {
                        *self = $crate::__private::serde_json::from_slice(bytes)?;
                        ::core::result::Result::Ok(())
                    }
                }
            )+
        };
    }

    /// 基于 `serde_json` 的序列化器。
    ///
    /// - 编码：[`JsonFrame::write_json`]，负载只包含具体值；
    /// - 解码：[`JsonFrame::read_json`]，填充解码表按 DTM 构造的空白实例。
    ///
    /// 负载与 DTM 指向的类型不符时（例如缺少必填字段），解码以
    /// [`CodecError::FailedToUnmarshalValue`](crate::CodecError) 失败，而不会改用负载“看起来像”的类型。
    #[derive(Clone, Copy, Debug, Default)]
    pub struct JsonSerializer;

    impl<E: JsonFrame + ?Sized> Marshal<E> for JsonSerializer {
        type Error = serde_json::Error;

        fn marshal(&self, value: &E) -> Result<Bytes, Self::Error> {
            value.write_json().map(Bytes::from)
        }
    }

    impl<D: JsonFrame> Unmarshal<D> for JsonSerializer {
        type Error = serde_json::Error;

        fn unmarshal(&self, bytes: &[u8], target: &mut D) -> Result<(), Self::Error> {
            target.read_json(bytes)
        }
    }

}
