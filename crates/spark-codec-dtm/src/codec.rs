use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::config::CodecConfig;
use crate::decode::{ConstructThenUnmarshal, DecodeValue};
use crate::dtm::{self, Dtm};
use crate::error::CodecError;
use crate::framing::byte_seq;
use crate::registry::{DecodeTable, EncodeRegistry, WireType};
use crate::serializer::Marshal;
use crate::transport::{ByteSink, ByteSource};

/// `Codec` 以 DTM + 长度前缀负载的形式在字节流上收发多态值。
///
/// # 设计初衷（Why）
/// - 传输层只认识字节，业务层却要在同一条流上混合发送多种具体类型；
/// - 在每个负载前写一个小整数标记（DTM），读端据此找到具体类型，再把负载交给该类型的反序列化逻辑。
///
/// # 行为逻辑（How）
/// - 编码：值 → [`TypeKey`](crate::TypeKey) → DTM → 写 DTM → 序列化 → 写 `varint(len) || bytes`；
/// - 解码：读 DTM → 区间校验 → 取槽位 → 读 `varint(len) || bytes` → 解码策略 → 值。
///
/// # 契约说明（What）
/// - `E` 为编码域（可以是 `dyn Trait`），`D` 为解码域，二者独立；
/// - 编码注册表与解码表在构建后不可变，编解码器不持有任何可变状态，可在多线程间共享并发调用；
///   前提是每次调用使用各自的 sink/source，且注入的序列化器本身线程安全；
/// - 所有返回值（成功或失败）都携带精确字节数，见 [`CodecError::processed`]；
/// - 编解码器从不重试、从不在调用路径上记录日志。
///
/// # 风险提示（Trade-offs）
/// - 编码注册表与解码表允许不一致，调用方需保证通信双方对 DTM 的理解相同，否则会在解码端
///   得到 [`CodecError::UnrecognizedDiscriminator`] 或把负载交给错误的类型。
pub struct Codec<E: ?Sized, D, S: ?Sized, H = ConstructThenUnmarshal> {
    encode: EncodeRegistry,
    decode: DecodeTable<D>,
    serializer: Arc<S>,
    decoder: H,
    config: CodecConfig,
    _encode_domain: PhantomData<fn(&E)>,
}

impl<E: ?Sized, D, S: ?Sized> Codec<E, D, S> {
    /// 使用默认解码策略 [`ConstructThenUnmarshal`] 构建编解码器。
    ///
    /// # Panics
    /// `encode` 或 `decode` 为空时 panic：这是构建期的契约违背，而不是运行期错误。
    pub fn new(encode: EncodeRegistry, decode: DecodeTable<D>, serializer: Arc<S>) -> Self {
        Self::with_decoder(encode, decode, serializer, ConstructThenUnmarshal)
    }
}

impl<E: ?Sized, D, S: ?Sized, H> Codec<E, D, S, H> {
    /// 使用自定义解码策略构建编解码器。
    ///
    /// # Panics
    /// `encode` 或 `decode` 为空时 panic。
    pub fn with_decoder(
        encode: EncodeRegistry,
        decode: DecodeTable<D>,
        serializer: Arc<S>,
        decoder: H,
    ) -> Self {
        assert!(!encode.is_empty(), "spark-codec-dtm: encode registry is empty");
        assert!(!decode.is_empty(), "spark-codec-dtm: decode table is empty");

        debug!(
            encode_types = encode.len(),
            decode_types = decode.len(),
            "dtm codec constructed"
        );
        if encode.len() != decode.len() {
            debug!(
                encode_types = encode.len(),
                decode_types = decode.len(),
                "asymmetric dtm codec: peers must only exchange DTMs present in the receiving decode table"
            );
        }

        Self {
            encode,
            decode,
            serializer,
            decoder,
            config: CodecConfig::default(),
            _encode_domain: PhantomData,
        }
    }

    /// 替换配置。
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// 当前生效的配置；未调用 [`with_config`](Self::with_config) 时为默认值（不限长度）。
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// 编码端映射，构建后只读。
    pub fn encode_registry(&self) -> &EncodeRegistry {
        &self.encode
    }

    /// 解码端映射，其长度即合法 DTM 区间的上界。
    pub fn decode_table(&self) -> &DecodeTable<D> {
        &self.decode
    }

    /// 注入的序列化器。
    ///
    /// 返回共享句柄本身，克隆出的编解码器与原实例指向同一个序列化器。
    pub fn serializer(&self) -> &Arc<S> {
        &self.serializer
    }
}

impl<E, D, S, H> Codec<E, D, S, H>
where
    E: WireType + ?Sized,
    S: Marshal<E> + ?Sized,
{
    /// 将 `value` 编码写入 `sink`，返回写出字节数。
    ///
    /// # 契约说明（What）
    /// - 类型未登记：[`CodecError::UnrecognizedType`]，未写出任何字节；
    /// - 写 DTM 失败：[`CodecError::FailedToMarshalDiscriminator`]，按原子步骤报告 0 字节；
    /// - 序列化失败：[`CodecError::FailedToMarshalValue`]，报告 DTM 字节数；
    /// - 写负载失败：[`CodecError::FailedToMarshalByteSequence`]，报告 DTM 字节数 + 长度前缀/负载已写出部分。
    pub fn encode<W>(&self, value: &E, sink: &mut W) -> Result<usize, CodecError>
    where
        W: ByteSink + ?Sized,
    {
        let key = value.type_key();
        let dtm = self
            .encode
            .resolve_discriminator(&key)
            .ok_or(CodecError::UnrecognizedType {
                type_name: key.name(),
            })?;

        let mut written = dtm::marshal(dtm, sink)
            .map_err(|err| CodecError::FailedToMarshalDiscriminator { source: err })?;

        let payload = self
            .serializer
            .marshal(value)
            .map_err(|err| CodecError::FailedToMarshalValue {
                type_name: key.name(),
                processed: written,
                source: Box::new(err),
            })?;

        let sequence = byte_seq::marshal(&payload, sink, self.config.max_payload_len).map_err(
            |err| CodecError::FailedToMarshalByteSequence {
                processed: written + err.processed(),
                source: err,
            },
        )?;
        written += sequence;
        Ok(written)
    }
}

impl<E, D, S, H> Codec<E, D, S, H>
where
    E: ?Sized,
    S: ?Sized,
    H: DecodeValue<D, S>,
{
    /// 从 `source` 解码一个值，返回值与读取字节数。
    ///
    /// # 契约说明（What）
    /// - 读 DTM 失败：[`CodecError::FailedToUnmarshalDiscriminator`]，报告 0 字节；
    /// - DTM 越界：[`CodecError::UnrecognizedDiscriminator`]，报告 DTM 字节数，负载未被读取；
    /// - 读负载失败：[`CodecError::FailedToUnmarshalByteSequence`]，报告 DTM 字节数 + 已读部分；
    /// - 解码策略失败：[`CodecError::FailedToUnmarshalValue`]，整帧已被消费，报告完整帧长。
    pub fn decode<R>(&self, source: &mut R) -> Result<(D, usize), CodecError>
    where
        R: ByteSource + ?Sized,
    {
        let (dtm, mut read) = dtm::unmarshal(source)
            .map_err(|err| CodecError::FailedToUnmarshalDiscriminator { source: err })?;

        let slot = self.resolve_slot(dtm, read)?;

        let (payload, sequence) = byte_seq::unmarshal(source, self.config.max_payload_len)
            .map_err(|err| CodecError::FailedToUnmarshalByteSequence {
                processed: read + err.processed(),
                source: err,
            })?;
        read += sequence;

        let value = self
            .decoder
            .decode_value(slot, &*self.serializer, &payload)
            .map_err(|err| CodecError::FailedToUnmarshalValue {
                dtm,
                type_name: slot.type_name(),
                processed: read,
                source: err,
            })?;
        Ok((value, read))
    }

    fn resolve_slot(
        &self,
        dtm: Dtm,
        read: usize,
    ) -> Result<&crate::registry::DecodeSlot<D>, CodecError> {
        self.decode
            .resolve_type(dtm)
            .ok_or(CodecError::UnrecognizedDiscriminator {
                dtm,
                table_len: self.decode.len(),
                processed: read,
            })
    }
}

impl<E: ?Sized, D, S: ?Sized, H: Clone> Clone for Codec<E, D, S, H> {
    fn clone(&self) -> Self {
        Self {
            encode: self.encode.clone(),
            decode: self.decode.clone(),
            serializer: Arc::clone(&self.serializer),
            decoder: self.decoder.clone(),
            config: self.config,
            _encode_domain: PhantomData,
        }
    }
}

impl<E: ?Sized, D, S: ?Sized, H> fmt::Debug for Codec<E, D, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("encode", &self.encode)
            .field("decode", &self.decode)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
