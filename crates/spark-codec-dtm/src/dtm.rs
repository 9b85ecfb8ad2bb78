//! 数据类型标记（DTM）及其分帧。
//!
//! DTM 是写在每个负载之前的小整数，读端据此在解码表中找到具体类型。
//! 线上格式为无符号 varint：128 种以内的类型恰好占 1 字节。

use core::fmt;

use crate::error::FramingError;
use crate::framing::varint;
use crate::transport::{ByteSink, ByteSource};

/// 数据类型标记，从 0 开始按注册顺序分配。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dtm(u32);

impl Dtm {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// 作为解码表下标使用。
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Dtm {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<usize> for Dtm {
    type Error = core::num::TryFromIntError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        u32::try_from(index).map(Self)
    }
}

impl fmt::Display for Dtm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 写出 DTM，返回写出字节数。
pub fn marshal<W: ByteSink + ?Sized>(dtm: Dtm, sink: &mut W) -> Result<usize, FramingError> {
    varint::marshal_u64(u64::from(dtm.0), sink)
}

/// 读取 DTM，返回标记与读取字节数。
pub fn unmarshal<R: ByteSource + ?Sized>(source: &mut R) -> Result<(Dtm, usize), FramingError> {
    let (value, read) = varint::unmarshal_u64(source, varint::MAX_LEN_U32, u64::from(u32::MAX))?;
    // unmarshal_u64 已保证 value <= u32::MAX。
    Ok((Dtm(value as u32), read))
}

/// DTM 编码后的字节数。
pub fn encoded_len(dtm: Dtm) -> usize {
    varint::encoded_len(u64::from(dtm.0))
}
