//! 传输层字节读写契约。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 编解码器只需要“单字节 + 批量”两类读写原语，不关心底层是 TCP 流、内存缓冲还是文件；
//! - 以最小 trait 表达这两类原语，使 `bytes` 缓冲与 `std::io` 流都能直接接入。
//!
//! ## 契约说明（What）
//! - `write`/`read` 允许短写/短读，返回实际处理的字节数；循环补齐由分帧原语负责；
//! - `read` 返回 `Ok(0)` 表示数据源已耗尽；
//! - 阻塞、超时与取消完全由实现决定，编解码器只透传错误。
//!
//! ## 风险提示（Trade-offs）
//! - 本层不提供缓冲；对 `IoSink` 包装的裸套接字逐字节写 varint 会产生多次系统调用，
//!   生产环境应在外层套一层 `std::io::BufWriter`。

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// 字节写入端。
pub trait ByteSink {
    /// 写出单个字节。
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// 写出字节切片的一个前缀，返回写出长度。
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// 字节读取端。
pub trait ByteSource {
    /// 读取单个字节；数据耗尽时返回 [`io::ErrorKind::UnexpectedEof`]。
    fn read_byte(&mut self) -> io::Result<u8>;

    /// 读取至多 `buf.len()` 个字节，返回实际读取长度。
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl ByteSink for BytesMut {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.put_u8(byte);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put_slice(buf);
        Ok(buf.len())
    }
}

fn eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "byte source exhausted")
}

fn read_from_buf<B: Buf + ?Sized>(src: &mut B, buf: &mut [u8]) -> usize {
    let n = buf.len().min(src.remaining());
    src.copy_to_slice(&mut buf[..n]);
    n
}

impl ByteSource for Bytes {
    fn read_byte(&mut self) -> io::Result<u8> {
        if self.has_remaining() {
            Ok(self.get_u8())
        } else {
            Err(eof())
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(read_from_buf(self, buf))
    }
}

impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<u8> {
        match self.split_first() {
            Some((&byte, rest)) => {
                *self = rest;
                Ok(byte)
            }
            None => Err(eof()),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(read_from_buf(self, buf))
    }
}

/// 将 [`io::Write`] 适配为 [`ByteSink`]。
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> ByteSink for IoSink<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }
}

/// 将 [`io::Read`] 适配为 [`ByteSource`]。
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: io::Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> ByteSource for IoSource<R> {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
