//! 无符号 LEB128 varint。
//!
//! 每字节低 7 位承载数据，最高位为续位标记；小于 128 的值恰好占 1 字节。

use crate::error::FramingError;
use crate::transport::{ByteSink, ByteSource};

/// `u32` 编码后的最大宽度。
pub const MAX_LEN_U32: usize = 5;
/// `u64` 编码后的最大宽度。
pub const MAX_LEN_U64: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// 计算 `value` 编码后的字节数。
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// 写出 `value`，返回写出字节数。
///
/// 失败时 `processed` 为失败前已写出的字节数。
pub fn marshal_u64<W: ByteSink + ?Sized>(mut value: u64, sink: &mut W) -> Result<usize, FramingError> {
    let mut written = 0;
    while value >= u64::from(CONTINUATION) {
        sink.write_byte((value as u8 & PAYLOAD_MASK) | CONTINUATION)
            .map_err(|err| FramingError::io(written, err))?;
        written += 1;
        value >>= 7;
    }
    sink.write_byte(value as u8)
        .map_err(|err| FramingError::io(written, err))?;
    Ok(written + 1)
}

/// 读取一个至多 `max_len` 字节、且不超过 `max_value` 的 varint。
///
/// 超宽或溢出时返回 [`FramingError::VarintOverflow`]，`processed` 包含触发溢出的那个字节。
pub fn unmarshal_u64<R: ByteSource + ?Sized>(
    source: &mut R,
    max_len: usize,
    max_value: u64,
) -> Result<(u64, usize), FramingError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut read = 0;
    loop {
        let byte = source
            .read_byte()
            .map_err(|err| FramingError::io(read, err))?;
        read += 1;

        let chunk = u64::from(byte & PAYLOAD_MASK);
        if shift >= 64 || (shift > 0 && chunk >> (64 - shift) != 0) {
            return Err(FramingError::VarintOverflow { processed: read });
        }
        value |= chunk << shift;

        if byte & CONTINUATION == 0 {
            if value > max_value {
                return Err(FramingError::VarintOverflow { processed: read });
            }
            return Ok((value, read));
        }
        if read == max_len {
            return Err(FramingError::VarintOverflow { processed: read });
        }
        shift += 7;
    }
}
