//! 长度前缀字节序列：`varint(len) || bytes`。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 负载本身不自带边界，需要先写长度才能让读端从流中无歧义地切出一帧；
//! - 长度使用与 DTM 相同的 varint，小负载只多占 1 字节。
//!
//! ## 契约说明（What）
//! - `limit` 为 `Some(n)` 时，长度大于 `n` 的序列在写端与读端都会被拒绝，返回
//!   [`FramingError::LengthExceeded`]；写端在写出任何字节之前就完成检查；
//! - 读端在确认长度后按块增长缓冲，未到达的数据不会提前占用内存；
//! - 所有失败都携带累计字节数：长度前缀字节 + 已传输的负载字节。

use bytes::{Bytes, BytesMut};

use super::varint;
use crate::error::FramingError;
use crate::transport::{ByteSink, ByteSource};

/// 单次读取的块大小上限。
const READ_CHUNK: usize = 8 * 1024;

/// 写出长度前缀与负载，返回写出总字节数。
pub fn marshal<W: ByteSink + ?Sized>(
    bytes: &[u8],
    sink: &mut W,
    limit: Option<usize>,
) -> Result<usize, FramingError> {
    if let Some(limit) = limit
        && bytes.len() > limit
    {
        return Err(FramingError::LengthExceeded {
            processed: 0,
            len: bytes.len() as u64,
            limit,
        });
    }

    let mut written = varint::marshal_u64(bytes.len() as u64, sink)?;
    let mut rest = bytes;
    while !rest.is_empty() {
        match sink.write(rest) {
            Ok(0) => {
                return Err(FramingError::io(
                    written,
                    std::io::Error::new(std::io::ErrorKind::WriteZero, "byte sink accepted no data"),
                ));
            }
            Ok(n) => {
                written += n;
                rest = &rest[n..];
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(FramingError::io(written, err)),
        }
    }
    Ok(written)
}

/// 读取长度前缀与负载，返回负载及读取总字节数。
pub fn unmarshal<R: ByteSource + ?Sized>(
    source: &mut R,
    limit: Option<usize>,
) -> Result<(Bytes, usize), FramingError> {
    let max_value = limit.map_or(usize::MAX as u64, |limit| limit as u64);
    let (len, prefix) = varint::unmarshal_u64(source, varint::MAX_LEN_U64, u64::MAX)?;
    if len > max_value {
        return Err(FramingError::LengthExceeded {
            processed: prefix,
            len,
            limit: limit.unwrap_or(usize::MAX),
        });
    }
    let len = len as usize;

    let mut buf = BytesMut::with_capacity(len.min(READ_CHUNK));
    let mut filled = 0;
    while filled < len {
        let target = len.min(filled + READ_CHUNK);
        buf.resize(target, 0);
        match source.read(&mut buf[filled..target]) {
            Ok(0) => {
                return Err(FramingError::io(
                    prefix + filled,
                    std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "byte source ended inside a byte sequence",
                    ),
                ));
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(FramingError::io(prefix + filled, err)),
        }
    }
    buf.truncate(len);
    Ok((buf.freeze(), prefix + len))
}
