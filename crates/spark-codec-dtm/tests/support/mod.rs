//! 契约测试共享的桩实现。
//!
//! - `MockSerializer`：以闭包注册 `marshal`/`unmarshal` 行为，未注册即调用会直接 panic；
//! - `ScriptedSink`/`ScriptedSource`：按注册顺序逐次回放读写步骤，步骤耗尽后再调用同样 panic，
//!   用于精确断言编解码器对 sink/source 的调用序列；
//! - `Alpha`/`Beta`/`Gamma` 与 `Message`/`Event`：测试用的编码域与解码域。

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use spark_codec_dtm::{
    ByteSink, ByteSource, Marshal, TypeKey, Unmarshal, WireType, json_frame, wire_type,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Alpha {
    pub id: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Beta {
    pub field: String,
}

/// 不在任何双类型注册表中的第三种类型。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gamma {
    pub z: f64,
}

wire_type!(Alpha, Beta, Gamma);

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Alpha(Alpha),
    Beta(Beta),
    Gamma(Gamma),
}

json_frame!(Message { Alpha, Beta, Gamma });

impl WireType for Message {
    fn type_key(&self) -> TypeKey {
        match self {
            Message::Alpha(_) => TypeKey::of::<Alpha>(),
            Message::Beta(_) => TypeKey::of::<Beta>(),
            Message::Gamma(_) => TypeKey::of::<Gamma>(),
        }
    }
}

impl From<Alpha> for Message {
    fn from(value: Alpha) -> Self {
        Message::Alpha(value)
    }
}

impl From<Beta> for Message {
    fn from(value: Beta) -> Self {
        Message::Beta(value)
    }
}

impl From<Gamma> for Message {
    fn from(value: Gamma) -> Self {
        Message::Gamma(value)
    }
}

/// trait 对象形式的编码域。
pub trait Event: WireType + Send + Sync {
    fn label(&self) -> String;
}

impl Event for Alpha {
    fn label(&self) -> String {
        format!("alpha:{}", self.id)
    }
}

impl Event for Beta {
    fn label(&self) -> String {
        format!("beta:{}", self.field)
    }
}

impl Event for Gamma {
    fn label(&self) -> String {
        format!("gamma:{}", self.z)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("mock failure: {0}")]
pub struct MockError(pub String);

type MarshalFn<E> = Box<dyn Fn(&E) -> Result<Bytes, MockError> + Send + Sync>;
type UnmarshalFn<D> = Box<dyn Fn(&[u8], &mut D) -> Result<(), MockError> + Send + Sync>;

pub struct MockSerializer<E: ?Sized, D> {
    marshal: Option<MarshalFn<E>>,
    unmarshal: Option<UnmarshalFn<D>>,
}

impl<E: ?Sized, D> MockSerializer<E, D> {
    pub fn new() -> Self {
        Self {
            marshal: None,
            unmarshal: None,
        }
    }

    pub fn on_marshal<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> Result<Bytes, MockError> + Send + Sync + 'static,
    {
        self.marshal = Some(Box::new(f));
        self
    }

    pub fn on_unmarshal<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8], &mut D) -> Result<(), MockError> + Send + Sync + 'static,
    {
        self.unmarshal = Some(Box::new(f));
        self
    }
}

impl<E: ?Sized, D> Marshal<E> for MockSerializer<E, D> {
    type Error = MockError;

    fn marshal(&self, value: &E) -> Result<Bytes, Self::Error> {
        let f = self.marshal.as_ref().expect("MockSerializer::marshal not registered");
        f(value)
    }
}

impl<E: ?Sized, D> Unmarshal<D> for MockSerializer<E, D> {
    type Error = MockError;

    fn unmarshal(&self, bytes: &[u8], target: &mut D) -> Result<(), Self::Error> {
        let f = self
            .unmarshal
            .as_ref()
            .expect("MockSerializer::unmarshal not registered");
        f(bytes, target)
    }
}

type WriteByteFn = Box<dyn FnMut(u8) -> io::Result<()> + Send>;
type WriteFn = Box<dyn FnMut(&[u8]) -> io::Result<usize> + Send>;

enum SinkStep {
    WriteByte(WriteByteFn),
    Write(WriteFn),
}

/// 按脚本回放的写入端。
#[derive(Default)]
pub struct ScriptedSink {
    steps: VecDeque<SinkStep>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_write_byte<F>(mut self, f: F) -> Self
    where
        F: FnMut(u8) -> io::Result<()> + Send + 'static,
    {
        self.steps.push_back(SinkStep::WriteByte(Box::new(f)));
        self
    }

    pub fn on_write<F>(mut self, f: F) -> Self
    where
        F: FnMut(&[u8]) -> io::Result<usize> + Send + 'static,
    {
        self.steps.push_back(SinkStep::Write(Box::new(f)));
        self
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }
}

impl ByteSink for ScriptedSink {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        match self.steps.pop_front() {
            Some(SinkStep::WriteByte(mut f)) => f(byte),
            Some(SinkStep::Write(_)) => panic!("expected write, got write_byte({byte})"),
            None => panic!("unexpected write_byte({byte})"),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(SinkStep::Write(mut f)) => f(buf),
            Some(SinkStep::WriteByte(_)) => panic!("expected write_byte, got write({buf:?})"),
            None => panic!("unexpected write({buf:?})"),
        }
    }
}

type ReadByteFn = Box<dyn FnMut() -> io::Result<u8> + Send>;
type ReadFn = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + Send>;

enum SourceStep {
    ReadByte(ReadByteFn),
    Read(ReadFn),
}

/// 按脚本回放的读取端。
#[derive(Default)]
pub struct ScriptedSource {
    steps: VecDeque<SourceStep>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_read_byte<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> io::Result<u8> + Send + 'static,
    {
        self.steps.push_back(SourceStep::ReadByte(Box::new(f)));
        self
    }

    pub fn on_read<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut [u8]) -> io::Result<usize> + Send + 'static,
    {
        self.steps.push_back(SourceStep::Read(Box::new(f)));
        self
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }
}

impl ByteSource for ScriptedSource {
    fn read_byte(&mut self) -> io::Result<u8> {
        match self.steps.pop_front() {
            Some(SourceStep::ReadByte(mut f)) => f(),
            Some(SourceStep::Read(_)) => panic!("expected read, got read_byte"),
            None => panic!("unexpected read_byte"),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(SourceStep::Read(mut f)) => f(buf),
            Some(SourceStep::ReadByte(_)) => panic!("expected read_byte, got read"),
            None => panic!("unexpected read of {} byte(s)", buf.len()),
        }
    }
}

pub fn io_error(message: &str) -> io::Error {
    io::Error::other(message.to_owned())
}
