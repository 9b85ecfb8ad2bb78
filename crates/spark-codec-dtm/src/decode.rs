//! 解码策略挂钩。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 编解码器在确定具体类型、读出负载后，把“字节 → 值”这一步交给可替换的策略；
//! - 默认策略是“构造空白实例，再交给序列化器填充”；调用方可以换成从对象池取实例、
//!   解码后做校验或修正等逻辑，而无需改动分帧流程。
//!
//! ## 契约说明（What）
//! - 策略每次解码调用一次，拿到解析出的 [`DecodeSlot`]、共享的序列化器与原始负载；
//! - 返回的错误由编解码器包装为 [`CodecError::FailedToUnmarshalValue`](crate::CodecError)，
//!   原始错误保留在 `source()` 中；
//! - 策略归编解码器所有，需满足 `Send + Sync` 以支持并发调用。

use core::fmt;

use crate::error::BoxError;
use crate::registry::DecodeSlot;
use crate::serializer::Unmarshal;

/// 解码策略：(槽位, 序列化器, 负载) → 值。
pub trait DecodeValue<D, S: ?Sized>: Send + Sync {
    fn decode_value(
        &self,
        slot: &DecodeSlot<D>,
        serializer: &S,
        payload: &[u8],
    ) -> Result<D, BoxError>;
}

/// 默认策略：`slot.instantiate()` 后调用 [`Unmarshal::unmarshal`] 原地填充。
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructThenUnmarshal;

impl<D, S> DecodeValue<D, S> for ConstructThenUnmarshal
where
    S: Unmarshal<D> + ?Sized,
{
    fn decode_value(
        &self,
        slot: &DecodeSlot<D>,
        serializer: &S,
        payload: &[u8],
    ) -> Result<D, BoxError> {
        let mut value = slot.instantiate();
        serializer.unmarshal(payload, &mut value)?;
        Ok(value)
    }
}

/// 以闭包实现的解码策略，由 [`decode_fn`] 构造。
#[derive(Clone, Copy)]
pub struct DecodeFn<F>(F);

impl<F> fmt::Debug for DecodeFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecodeFn")
    }
}

/// 把闭包包装为解码策略。
///
/// ```
/// use spark_codec_dtm::{DecodeValue, DecodeSlot, TypeKey, decode_fn};
///
/// let hook = decode_fn(|slot: &DecodeSlot<String>, _ser: &(), payload: &[u8]| {
///     let mut value = slot.instantiate();
///     value.push_str(std::str::from_utf8(payload)?);
///     Ok(value)
/// });
/// let slot = DecodeSlot::new(TypeKey::of::<String>(), || String::from(">"));
/// assert_eq!(hook.decode_value(&slot, &(), b"hi").unwrap(), ">hi");
/// ```
pub fn decode_fn<D, S, F>(f: F) -> DecodeFn<F>
where
    S: ?Sized,
    F: Fn(&DecodeSlot<D>, &S, &[u8]) -> Result<D, BoxError> + Send + Sync,
{
    DecodeFn(f)
}

impl<D, S, F> DecodeValue<D, S> for DecodeFn<F>
where
    S: ?Sized,
    F: Fn(&DecodeSlot<D>, &S, &[u8]) -> Result<D, BoxError> + Send + Sync,
{
    fn decode_value(
        &self,
        slot: &DecodeSlot<D>,
        serializer: &S,
        payload: &[u8],
    ) -> Result<D, BoxError> {
        (self.0)(slot, serializer, payload)
    }
}
