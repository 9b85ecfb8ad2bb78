//! 类型注册表：具体类型与 DTM 的双向映射。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 编码端需要“值 → 具体类型 → DTM”，解码端需要“DTM → 具体类型 → 空白实例”；
//! - Rust 没有运行时按类型实例化的反射能力，因此解码端直接登记构造闭包，
//!   把“实例化”折叠进注册表本身。
//!
//! ## 契约说明（What）
//! - [`EncodeRegistry`] 与 [`DecodeTable`] 独立构建，**允许长度与内容不同**：这支持
//!   “编码 trait 对象、解码具体枚举”之类的非对称域。保证对端写出的 DTM 落在本端解码表
//!   范围内是调用方的责任；编解码器只在构建时记录一条 `debug` 日志提示这一约定；
//! - DTM 严格等于登记时的位置下标，注册表不去重：同一类型重复登记时，编码端以最后一次
//!   出现的位置为准；
//! - 查找是精确匹配，不存在子类型/父类型回退。
//!
//! ## 风险提示（Trade-offs）
//! - [`TypeKey`] 以 [`TypeId`] 判等，泛型实例化不同的类型是不同的键；
//! - 解码表的工厂闭包以 `Arc` 共享存放，克隆解码表不复制闭包，但每次解码多一次间接调用。

use core::any::{TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dtm::Dtm;

/// 具体类型的身份标识。
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// 取 `T` 的身份标识；`dyn Trait` 等非定长类型同样可用。
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// 判等与哈希所用的 [`TypeId`]。
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 仅用于诊断，不参与判等。
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 编码域中的值报告自己的具体类型。
///
/// 对枚举形式的编码域，按变体返回其承载类型的 [`TypeKey`]；对 trait 对象形式的编码域，
/// 由每个具体类型返回 `TypeKey::of::<Self>()`。普通结构体可用 [`wire_type!`](crate::wire_type)
/// 一次性生成实现。
pub trait WireType {
    fn type_key(&self) -> TypeKey;
}

impl<T: WireType + ?Sized> WireType for &T {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: WireType + ?Sized> WireType for Box<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: WireType + ?Sized> WireType for Arc<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

/// 为结构体生成 `WireType::type_key() == TypeKey::of::<Self>()` 的实现。
///
/// ```
/// use spark_codec_dtm::{TypeKey, WireType, wire_type};
///
/// struct Ping;
/// struct Pong;
/// wire_type!(Ping, Pong);
///
/// assert_eq!(Ping.type_key(), TypeKey::of::<Ping>());
/// ```
#[macro_export]
macro_rules! wire_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WireType for $ty {
                fn type_key(&self) -> $crate::TypeKey {
                    $crate::TypeKey::of::<$ty>()
                }
            }
        )+
    };
}

/// 编码端映射：具体类型 → DTM。
#[derive(Clone, Debug)]
pub struct EncodeRegistry {
    map: HashMap<TypeKey, Dtm>,
    len: usize,
}

impl EncodeRegistry {
    /// 以位置下标为 DTM 构建映射。
    ///
    /// # Panics
    /// 类型数量超过 `u32::MAX` 时 panic。
    pub fn new<I>(types: I) -> Self
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let mut map = HashMap::new();
        let mut len = 0;
        for (index, key) in types.into_iter().enumerate() {
            let dtm = match Dtm::try_from(index) {
                Ok(dtm) => dtm,
                Err(_) => panic!("spark-codec-dtm: encode registry exceeds the DTM range"),
            };
            map.insert(key, dtm);
            len = index + 1;
        }
        Self { map, len }
    }

    /// 精确匹配查找。
    pub fn resolve_discriminator(&self, key: &TypeKey) -> Option<Dtm> {
        self.map.get(key).copied()
    }

    /// 登记时的条目数（含重复项）。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 为空的注册表无法构建编解码器。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<TypeKey> for EncodeRegistry {
    fn from_iter<I: IntoIterator<Item = TypeKey>>(iter: I) -> Self {
        Self::new(iter)
    }
}

type Factory<D> = Arc<dyn Fn() -> D + Send + Sync>;

/// 解码表的一个槽位：具体类型及其空白实例的构造闭包。
pub struct DecodeSlot<D> {
    key: TypeKey,
    factory: Factory<D>,
}

impl<D> DecodeSlot<D> {
    /// 以类型标识与构造闭包创建槽位。
    ///
    /// # 契约说明（What）
    /// - `factory` 每次解码调用一次，必须返回 `key` 所指类型的空白实例（枚举解码域即对应变体）；
    ///   序列化器只填充内容，解码结果的类型完全由这里决定；
    /// - 闭包需 `Send + Sync`，以便编解码器被多线程共享。
    pub fn new<F>(key: TypeKey, factory: F) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
    {
        Self {
            key,
            factory: Arc::new(factory),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// 诊断用类型名，出现在 [`CodecError::FailedToUnmarshalValue`](crate::CodecError) 中。
    pub fn type_name(&self) -> &'static str {
        self.key.name
    }

    /// 构造该类型的空白实例，交给序列化器填充。
    pub fn instantiate(&self) -> D {
        (self.factory)()
    }
}

impl<D> Clone for DecodeSlot<D> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<D> fmt::Debug for DecodeSlot<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeSlot").field("key", &self.key).finish()
    }
}

/// 解码端映射：DTM → 槽位，长度即合法 DTM 区间 `[0, len)`。
pub struct DecodeTable<D> {
    slots: Vec<DecodeSlot<D>>,
}

impl<D> fmt::Debug for DecodeTable<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter().map(|slot| slot.key)).finish()
    }
}

impl<D> Clone for DecodeTable<D> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<D> DecodeTable<D> {
    /// 按登记顺序分配 DTM 的构建器。
    pub fn builder() -> DecodeTableBuilder<D> {
        DecodeTableBuilder { slots: Vec::new() }
    }

    /// 直接以槽位序列构建，第 `i` 个槽位对应 DTM `i`。
    pub fn from_slots(slots: Vec<DecodeSlot<D>>) -> Self {
        Self { slots }
    }

    /// 越界返回 `None`。
    pub fn resolve_type(&self, dtm: Dtm) -> Option<&DecodeSlot<D>> {
        self.slots.get(dtm.index())
    }

    /// 槽位数量，合法 DTM 为 `[0, len)`。
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 按 DTM 升序遍历槽位。
    pub fn iter(&self) -> impl Iterator<Item = (Dtm, &DecodeSlot<D>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (Dtm::new(index as u32), slot))
    }
}

/// 按登记顺序分配 DTM 的解码表构建器。
pub struct DecodeTableBuilder<D> {
    slots: Vec<DecodeSlot<D>>,
}

impl<D: 'static> DecodeTableBuilder<D> {
    /// 登记 `T`，空白实例取 `T::default()` 并转换为解码域类型。
    pub fn register<T>(self) -> Self
    where
        T: Default + Into<D> + 'static,
    {
        self.register_with::<T, _>(|| T::default().into())
    }

    /// 登记 `T`，空白实例由 `factory` 构造。
    pub fn register_with<T, F>(mut self, factory: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn() -> D + Send + Sync + 'static,
    {
        self.slots.push(DecodeSlot::new(TypeKey::of::<T>(), factory));
        self
    }

    /// 完成构建；空表同样可以构建，但会在编解码器构建时被拒绝。
    pub fn build(self) -> DecodeTable<D> {
        DecodeTable { slots: self.slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Alpha;
    #[derive(Debug, Default, PartialEq)]
    struct Beta(u8);

    #[derive(Debug, PartialEq)]
    enum Msg {
        Alpha(Alpha),
        Beta(Beta),
    }

    impl From<Alpha> for Msg {
        fn from(v: Alpha) -> Self {
            Msg::Alpha(v)
        }
    }

    impl From<Beta> for Msg {
        fn from(v: Beta) -> Self {
            Msg::Beta(v)
        }
    }

    crate::wire_type!(Alpha, Beta);

    #[test]
    fn encode_registry_assigns_positional_dtm() {
        let registry = EncodeRegistry::new([TypeKey::of::<Alpha>(), TypeKey::of::<Beta>()]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.resolve_discriminator(&Beta(3).type_key()),
            Some(Dtm::new(1))
        );
        assert_eq!(registry.resolve_discriminator(&TypeKey::of::<u8>()), None);
    }

    #[test]
    fn duplicate_registration_keeps_last_position() {
        let registry: EncodeRegistry = [
            TypeKey::of::<Alpha>(),
            TypeKey::of::<Beta>(),
            TypeKey::of::<Alpha>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.resolve_discriminator(&TypeKey::of::<Alpha>()),
            Some(Dtm::new(2))
        );
    }

    #[test]
    fn wire_type_forwards_through_smart_pointers() {
        let boxed: Box<dyn WireType> = Box::new(Beta(1));
        let shared: Arc<dyn WireType> = Arc::new(Alpha);
        assert_eq!(boxed.type_key(), TypeKey::of::<Beta>());
        assert_eq!((&shared).type_key(), TypeKey::of::<Alpha>());
    }

    #[test]
    fn decode_table_is_bounds_checked() {
        let table = DecodeTable::<Msg>::builder()
            .register::<Alpha>()
            .register_with::<Beta, _>(|| Msg::Beta(Beta(9)))
            .build();
        assert_eq!(table.len(), 2);

        let slot = table.resolve_type(Dtm::new(1)).expect("slot 1");
        assert_eq!(slot.key(), TypeKey::of::<Beta>());
        assert_eq!(slot.instantiate(), Msg::Beta(Beta(9)));
        assert!(slot.type_name().ends_with("Beta"));

        assert!(table.resolve_type(Dtm::new(2)).is_none());
        let dtms: Vec<u32> = table.iter().map(|(dtm, _)| dtm.get()).collect();
        assert_eq!(dtms, vec![0, 1]);
    }
}
