//! Compile-time typed views over untyped node identifiers.
//!
//! [`Identifier<T>`] is a `NodeId` that remembers its payload type, and
//! the view types borrow the store to read or write that payload without
//! repeating the type at every call. The stored type tag is consulted
//! only by debug assertions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use strand_core::{NodeId, TypeTag};

use crate::error::ArenaError;
use crate::payload::Payload;
use crate::store::NodeStore;

/// A [`NodeId`] whose payload elements are `T`.
pub struct Identifier<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Identifier<T> {
    /// The typed sentinel.
    pub const INVALID: Self = Self::from_raw(NodeId::INVALID);

    /// Wrap `id` without checking the stored type.
    pub const fn from_raw(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped identifier.
    pub const fn raw(self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Identifier<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Identifier<T> {}

impl<T> PartialEq for Identifier<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Identifier<T> {}

impl<T> Hash for Identifier<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Identifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier<{}>({})", std::any::type_name::<T>(), self.id)
    }
}

impl<T> From<Identifier<T>> for NodeId {
    fn from(id: Identifier<T>) -> NodeId {
        id.id
    }
}

/// Shared typed view of one node.
pub struct NodeRef<'a, T> {
    store: &'a NodeStore,
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> NodeRef<'_, T> {
    /// The node's identifier.
    pub fn id(&self) -> Identifier<T> {
        Identifier::from_raw(self.id)
    }

    /// The node's type tag.
    pub fn type_tag(&self) -> TypeTag {
        self.store.type_tag(self.id)
    }

    /// The node's parent.
    pub fn parent(&self) -> NodeId {
        self.store.parent(self.id)
    }

    /// Decode the first payload element.
    pub fn get(&self) -> T {
        self.store.read(self.id)
    }
}

/// Exclusive typed view of one node.
pub struct NodeMut<'a, T> {
    store: &'a mut NodeStore,
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> NodeMut<'_, T> {
    /// Decode the first payload element.
    pub fn get(&self) -> T {
        self.store.read(self.id)
    }

    /// Overwrite the first payload element.
    pub fn set(&mut self, value: &T) {
        self.store.write(self.id, value);
    }

    /// Read, modify in place, and write back the first payload element.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(&value);
    }
}

/// Shared view of an array payload.
pub struct ArrayView<'a, T> {
    bytes: &'a [u8],
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> ArrayView<'_, T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode element `index`, if in range.
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len()).then(|| T::decode(&self.bytes[index * T::SIZE..]))
    }

    /// Decode every element in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(|i| T::decode(&self.bytes[i * T::SIZE..]))
    }
}

/// Exclusive view of an array payload.
pub struct ArrayViewMut<'a, T> {
    bytes: &'a mut [u8],
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> ArrayViewMut<'_, T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode element `index`, if in range.
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len()).then(|| T::decode(&self.bytes[index * T::SIZE..]))
    }

    /// Encode `value` at `index`. Panics if out of range.
    pub fn set(&mut self, index: usize, value: &T) {
        assert!(index < self.len(), "array index {index} out of range");
        value.encode(&mut self.bytes[index * T::SIZE..]);
    }
}

impl NodeStore {
    /// [`allocate`](Self::allocate) returning a typed identifier.
    pub fn allocate_typed<T: Payload>(
        &mut self,
        value: &T,
        tag: TypeTag,
        parent: NodeId,
    ) -> Result<Identifier<T>, ArenaError> {
        self.allocate(value, tag, parent).map(Identifier::from_raw)
    }

    /// [`allocate_array`](Self::allocate_array) returning a typed identifier.
    pub fn allocate_array_typed<T: Payload>(
        &mut self,
        values: &[T],
        tag: TypeTag,
        parent: NodeId,
    ) -> Result<Identifier<T>, ArenaError> {
        self.allocate_array(values, tag, parent).map(Identifier::from_raw)
    }

    #[inline]
    fn debug_check_type<T: Payload>(&self, id: NodeId) {
        debug_assert!(self.is_valid(id), "typed access to dead node {id}");
        debug_assert_eq!(
            self.element_size(self.type_tag(id)),
            T::SIZE,
            "{id} does not hold {}",
            std::any::type_name::<T>()
        );
    }

    /// Shared typed view of `id`.
    pub fn get<T: Payload>(&self, id: Identifier<T>) -> NodeRef<'_, T> {
        self.debug_check_type::<T>(id.raw());
        NodeRef {
            store: self,
            id: id.raw(),
            _marker: PhantomData,
        }
    }

    /// Exclusive typed view of `id`.
    pub fn get_mut<T: Payload>(&mut self, id: Identifier<T>) -> NodeMut<'_, T> {
        self.debug_check_type::<T>(id.raw());
        NodeMut {
            store: self,
            id: id.raw(),
            _marker: PhantomData,
        }
    }

    /// Shared view of `id`'s payload elements.
    pub fn array<T: Payload>(&self, id: Identifier<T>) -> ArrayView<'_, T> {
        self.debug_check_type::<T>(id.raw());
        ArrayView {
            bytes: self.payload_bytes(id.raw()),
            len: self.element_count(id.raw()) as usize,
            _marker: PhantomData,
        }
    }

    /// Exclusive view of `id`'s payload elements. Marks the node dirty.
    pub fn array_mut<T: Payload>(&mut self, id: Identifier<T>) -> ArrayViewMut<'_, T> {
        self.debug_check_type::<T>(id.raw());
        let len = self.element_count(id.raw()) as usize;
        ArrayViewMut {
            bytes: self.payload_bytes_mut(id.raw()),
            len,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::StoreConfig;
    use crate::header::NodeFlags;
    use crate::layout::{LayoutTable, TypeLayout};

    const GROUP: TypeTag = TypeTag(16);
    const POINT: TypeTag = TypeTag(17);
    const MARKER: TypeTag = TypeTag(18);

    fn store() -> NodeStore {
        let mut table = LayoutTable::new();
        table.insert(GROUP, TypeLayout::of::<()>());
        table.insert(POINT, TypeLayout::of::<[i32; 2]>());
        table.insert(MARKER, TypeLayout::of::<()>());
        NodeStore::new(StoreConfig::default(), Arc::new(table)).unwrap()
    }

    #[test]
    fn typed_read_and_update() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let p = s.allocate_typed(&[1i32, 2], POINT, root).unwrap();
        assert_eq!(s.get(p).get(), [1, 2]);
        assert_eq!(s.get(p).parent(), root);
        s.get_mut(p).update(|v| v[1] = 5);
        assert_eq!(s.get(p).get(), [1, 5]);
        assert_eq!(NodeId::from(p), s.get(p).id().raw());
    }

    #[test]
    fn array_views() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let arr = s
            .allocate_array_typed(&[[0i32, 0], [1, 1], [2, 2]], POINT, root)
            .unwrap();
        assert_eq!(s.array(arr).len(), 3);
        assert_eq!(s.array(arr).get(3), None);

        s.array_mut(arr).set(1, &[9, 9]);
        let values: Vec<[i32; 2]> = s.array(arr).iter().collect();
        assert_eq!(values, vec![[0, 0], [9, 9], [2, 2]]);
        assert!(s.flags(arr.raw()).contains(NodeFlags::DIRTY));
    }

    #[test]
    fn identifiers_compare_by_raw_id() {
        let a: Identifier<f32> = Identifier::from_raw(NodeId(3));
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, Identifier::INVALID);
        assert!(format!("{a:?}").contains("f32"));
    }

    #[test]
    fn zero_sized_elements_keep_their_count() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let markers = s.allocate_array_typed(&[(); 5], MARKER, root).unwrap();
        assert_eq!(s.array(markers).len(), 5);
        assert_eq!(s.array(markers).iter().count(), 5);
        assert_eq!(s.array(markers).get(4), Some(()));
        assert_eq!(s.array(markers).get(5), None);
        assert_eq!(s.array_mut(markers).len(), 5);
    }
}
