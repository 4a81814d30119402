//! Static registration of node types.
//!
//! A [`TaskRegistry`] maps each [`TypeTag`] to its payload layout, its
//! dependency fields and its execute function. It is assembled once at
//! startup through [`TaskRegistryBuilder`] and shared immutably after
//! that; the arena receives the layout half as an `Arc<LayoutTable>`.

use std::sync::Arc;

use indexmap::IndexMap;
use strand_arena::{LayoutTable, NodeStore, Payload, TypeLayout, RECORD_ALIGN};
use strand_core::{NodeId, Status, TypeTag};

use crate::composite;
use crate::context::ExecContext;
use crate::error::RegistryError;

/// Execute function for one node type.
///
/// Receives the context and the node being run. Composite types decide
/// whether and in what order to run their children through
/// [`ExecContext::execute`].
pub type ExecuteFn = fn(&mut ExecContext<'_>, NodeId) -> Status;

/// Declaration of one node type, consumed by [`TaskRegistryBuilder::register`].
#[derive(Clone, Debug)]
pub struct TypeDecl {
    tag: TypeTag,
    name: &'static str,
    layout: TypeLayout,
    execute: Option<ExecuteFn>,
}

impl TypeDecl {
    /// Declare `tag` with payload elements of type `T`.
    pub fn new<T: Payload>(tag: TypeTag, name: &'static str) -> Self {
        Self::with_size(tag, name, T::SIZE)
    }

    /// Declare `tag` with elements of `element_size` bytes.
    pub fn with_size(tag: TypeTag, name: &'static str, element_size: usize) -> Self {
        Self {
            tag,
            name,
            layout: TypeLayout::with_size(element_size),
            execute: None,
        }
    }

    /// Byte offset of a `NodeId` field this type reads.
    pub fn input(mut self, offset: u32) -> Self {
        self.layout.inputs.push(offset);
        self
    }

    /// Byte offset of a `NodeId` field this type writes.
    pub fn output(mut self, offset: u32) -> Self {
        self.layout.outputs.push(offset);
        self
    }

    /// Order this type's children by their dependency edges.
    pub fn sortable(mut self) -> Self {
        self.layout.sortable = true;
        self
    }

    /// Required payload alignment. Anything above 4 is rejected at build.
    pub fn alignment(mut self, alignment: usize) -> Self {
        self.layout.alignment = alignment;
        self
    }

    /// Function run when a node of this type executes.
    pub fn execute(mut self, f: ExecuteFn) -> Self {
        self.execute = Some(f);
        self
    }

    /// The declared tag.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Registered type entry.
#[derive(Clone, Copy, Debug)]
pub struct TaskEntry {
    /// Human-readable type name.
    pub name: &'static str,
    /// Execute function; `None` for pure data nodes.
    pub execute: Option<ExecuteFn>,
}

/// Builder for [`TaskRegistry`].
#[derive(Debug, Default)]
pub struct TaskRegistryBuilder {
    decls: IndexMap<TypeTag, TypeDecl>,
    builtin: Vec<TypeTag>,
    first_error: Option<RegistryError>,
}

impl TaskRegistryBuilder {
    /// Register the five built-in control-flow variants at their reserved tags.
    pub fn with_control_flow(mut self) -> Self {
        for decl in composite::control_flow_decls() {
            self.builtin.push(decl.tag);
            self.insert(decl);
        }
        self
    }

    /// Register a user type.
    pub fn register(mut self, decl: TypeDecl) -> Self {
        self.insert(decl);
        self
    }

    fn insert(&mut self, decl: TypeDecl) {
        if let Some(existing) = self.decls.get(&decl.tag) {
            self.first_error.get_or_insert(RegistryError::DuplicateTag {
                tag: decl.tag,
                first: existing.name,
                second: decl.name,
            });
            return;
        }
        self.decls.insert(decl.tag, decl);
    }

    /// Validate every declaration and freeze the registry.
    pub fn build(self) -> Result<TaskRegistry, RegistryError> {
        if let Some(err) = self.first_error {
            return Err(err);
        }

        let mut layouts = LayoutTable::new();
        let mut entries: Vec<Option<TaskEntry>> = Vec::new();
        for (tag, decl) in self.decls {
            if tag.is_reserved() && !self.builtin.contains(&tag) {
                return Err(RegistryError::ReservedTag {
                    tag,
                    name: decl.name,
                });
            }
            let alignment = decl.layout.alignment;
            if !alignment.is_power_of_two() || alignment > RECORD_ALIGN {
                return Err(RegistryError::UnsupportedAlignment { tag, alignment });
            }
            let element_size = decl.layout.element_size;
            if let Some(&offset) = decl
                .layout
                .inputs
                .iter()
                .chain(&decl.layout.outputs)
                .find(|&&o| o as usize + NodeId::SIZE > element_size)
            {
                return Err(RegistryError::FieldOutOfBounds {
                    tag,
                    offset,
                    element_size,
                });
            }

            let index = tag.0 as usize;
            if index >= entries.len() {
                entries.resize(index + 1, None);
            }
            entries[index] = Some(TaskEntry {
                name: decl.name,
                execute: decl.execute,
            });
            layouts.insert(tag, decl.layout);
        }

        tracing::debug!(types = layouts.len(), "task registry built");
        Ok(TaskRegistry {
            layouts: Arc::new(layouts),
            entries,
        })
    }
}

/// Immutable tag → layout and execute-function table.
#[derive(Clone, Debug)]
pub struct TaskRegistry {
    layouts: Arc<LayoutTable>,
    entries: Vec<Option<TaskEntry>>,
}

impl TaskRegistry {
    /// Start a new registry.
    pub fn builder() -> TaskRegistryBuilder {
        TaskRegistryBuilder::default()
    }

    /// Layout table shared with every store built from this registry.
    pub fn layouts(&self) -> &Arc<LayoutTable> {
        &self.layouts
    }

    /// Entry for `tag`.
    #[inline]
    pub fn entry(&self, tag: TypeTag) -> Option<&TaskEntry> {
        self.entries.get(tag.0 as usize)?.as_ref()
    }

    /// Execute function for `tag`, if any.
    #[inline]
    pub fn execute_fn(&self, tag: TypeTag) -> Option<ExecuteFn> {
        self.entry(tag)?.execute
    }

    /// Name registered for `tag`.
    pub fn name(&self, tag: TypeTag) -> Option<&'static str> {
        self.entry(tag).map(|e| e.name)
    }

    /// Whether `tag`'s children are dependency-ordered.
    pub fn is_sortable(&self, tag: TypeTag) -> bool {
        self.layouts.get(tag).is_some_and(|l| l.sortable)
    }

    /// Create an empty store over this registry's layouts.
    pub fn new_store(
        &self,
        config: strand_arena::StoreConfig,
    ) -> Result<NodeStore, strand_arena::ArenaError> {
        NodeStore::new(config, Arc::clone(&self.layouts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(_: &mut ExecContext<'_>, _: NodeId) -> Status {
        Status::Success
    }

    #[test]
    fn control_flow_occupies_reserved_tags() {
        let registry = TaskRegistry::builder().with_control_flow().build().unwrap();
        for tag in [
            TypeTag::ALL_OF,
            TypeTag::ANY_OF,
            TypeTag::GUARDED,
            TypeTag::RESUMABLE_SEQUENCE,
            TypeTag::CONCURRENT_ALL,
        ] {
            assert!(registry.execute_fn(tag).is_some(), "{tag}");
        }
        assert_eq!(registry.name(TypeTag::ALL_OF), Some("all_of"));
    }

    #[test]
    fn user_type_round_trips_layout() {
        let registry = TaskRegistry::builder()
            .register(
                TypeDecl::new::<[NodeId; 2]>(TypeTag(20), "link")
                    .input(0)
                    .output(4)
                    .sortable()
                    .execute(leaf),
            )
            .build()
            .unwrap();
        let layout = registry.layouts().get(TypeTag(20)).unwrap();
        assert_eq!(layout.element_size, 8);
        assert_eq!(layout.inputs.as_slice(), &[0]);
        assert_eq!(layout.outputs.as_slice(), &[4]);
        assert!(registry.is_sortable(TypeTag(20)));
        assert!(registry.entry(TypeTag(21)).is_none());
    }

    #[test]
    fn duplicate_tag_rejected() {
        let err = TaskRegistry::builder()
            .register(TypeDecl::new::<u32>(TypeTag(20), "a"))
            .register(TypeDecl::new::<u32>(TypeTag(20), "b"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTag {
                tag: TypeTag(20),
                first: "a",
                second: "b"
            }
        );
    }

    #[test]
    fn reserved_tag_rejected_for_user_types() {
        let err = TaskRegistry::builder()
            .register(TypeDecl::new::<u32>(TypeTag(7), "sneaky"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::ReservedTag { tag: TypeTag(7), .. }));
    }

    #[test]
    fn wide_alignment_rejected() {
        let err = TaskRegistry::builder()
            .register(TypeDecl::new::<u64>(TypeTag(20), "wide").alignment(8))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnsupportedAlignment {
                tag: TypeTag(20),
                alignment: 8
            }
        );
    }

    #[test]
    fn field_past_element_rejected() {
        let err = TaskRegistry::builder()
            .register(TypeDecl::new::<u64>(TypeTag(20), "short").input(6))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::FieldOutOfBounds { offset: 6, .. }));
    }
}
