//! Arena-owned control tree.
//!
//! The arena is the sole owner of all controls; parent links are non-owning
//! back indices, which keeps the tree free of ownership cycles. Child order
//! is insertion order and is preserved.

use trellis_core::{EngineError, EngineResult};

use crate::control::Control;

/// Stable arena index of a control node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(u32);

impl ControlId {
    /// Build an id from a raw arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

struct ControlEntry {
    name: String,
    control_id: String,
    parent: Option<ControlId>,
    children: Vec<ControlId>,
    control: Box<dyn Control>,
}

/// Arena of control nodes addressed by [`ControlId`].
///
/// Removed nodes leave tombstone slots so existing ids stay stable within
/// a page's lifetime. Accessors taking a [`ControlId`] panic if the id
/// refers to a removed node; when an id may have outlived its node (a
/// root handle held across tree mutation), check
/// [`ControlArena::contains`] first.
#[derive(Default)]
pub struct ControlArena {
    entries: Vec<Option<ControlEntry>>,
}

impl ControlArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root control (no parent). The derived id equals the name.
    pub fn insert_root(
        &mut self,
        name: impl Into<String>,
        control: Box<dyn Control>,
    ) -> EngineResult<ControlId> {
        let name = name.into();
        let root_clash = self.entries.iter().flatten().any(|e| {
            e.parent.is_none() && e.name == name
        });
        if root_clash {
            return Err(EngineError::DuplicateControlName { name });
        }
        Ok(self.push_entry(name.clone(), name, None, control))
    }

    /// Insert a child control under `parent`.
    ///
    /// The derived id is the path of names from the root joined with `_`;
    /// it is the key used for ajax targeting and head-resource dedup.
    pub fn insert(
        &mut self,
        parent: ControlId,
        name: impl Into<String>,
        control: Box<dyn Control>,
    ) -> EngineResult<ControlId> {
        let name = name.into();
        let (parent_control_id, sibling_clash) = {
            let entry = self.entry(parent);
            let clash = entry
                .children
                .iter()
                .any(|&c| self.entry(c).name == name);
            (entry.control_id.clone(), clash)
        };
        if sibling_clash {
            return Err(EngineError::DuplicateControlName { name });
        }

        let control_id = format!("{parent_control_id}_{name}");
        let id = self.push_entry(name, control_id, Some(parent), control);
        self.entry_mut(parent).children.push(id);
        Ok(id)
    }

    fn push_entry(
        &mut self,
        name: String,
        control_id: String,
        parent: Option<ControlId>,
        control: Box<dyn Control>,
    ) -> ControlId {
        let id = ControlId::from_index(self.entries.len());
        self.entries.push(Some(ControlEntry {
            name,
            control_id,
            parent,
            children: Vec::new(),
            control,
        }));
        id
    }

    fn entry(&self, id: ControlId) -> &ControlEntry {
        self.entries[id.index()]
            .as_ref()
            .expect("control id refers to a removed node")
    }

    fn entry_mut(&mut self, id: ControlId) -> &mut ControlEntry {
        self.entries[id.index()]
            .as_mut()
            .expect("control id refers to a removed node")
    }

    /// Check whether `id` refers to a live node.
    pub fn contains(&self, id: ControlId) -> bool {
        self.entries
            .get(id.index())
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Name of a control (unique among its siblings).
    pub fn name(&self, id: ControlId) -> &str {
        &self.entry(id).name
    }

    /// Derived id of a control.
    pub fn control_id(&self, id: ControlId) -> &str {
        &self.entry(id).control_id
    }

    /// Parent of a control, if it is not a root.
    pub fn parent(&self, id: ControlId) -> Option<ControlId> {
        self.entry(id).parent
    }

    /// Children of a control, in insertion order.
    pub fn children(&self, id: ControlId) -> &[ControlId] {
        &self.entry(id).children
    }

    /// Shared access to the control behavior.
    pub fn control(&self, id: ControlId) -> &dyn Control {
        self.entry(id).control.as_ref()
    }

    /// Mutable access to the control behavior.
    pub fn control_mut(&mut self, id: ControlId) -> &mut dyn Control {
        self.entry_mut(id).control.as_mut()
    }

    /// Pre-order traversal of the subtree rooted at `root`.
    pub fn walk(&self, root: ControlId) -> Vec<ControlId> {
        let mut order = Vec::new();
        self.walk_into(root, &mut order);
        order
    }

    fn walk_into(&self, id: ControlId, order: &mut Vec<ControlId>) {
        order.push(id);
        for &child in &self.entry(id).children {
            self.walk_into(child, order);
        }
    }

    /// Find a live control by its derived id.
    pub fn find_by_control_id(&self, control_id: &str) -> Option<ControlId> {
        self.entries.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .filter(|e| e.control_id == control_id)
                .map(|_| ControlId::from_index(i))
        })
    }

    /// Remove a control and its subtree.
    ///
    /// Fires `on_destroy` bottom-up (children before parents) so controls
    /// deregister before their owner goes away.
    pub fn remove(&mut self, id: ControlId) {
        if !self.contains(id) {
            return;
        }
        if let Some(parent) = self.entry(id).parent {
            self.entry_mut(parent).children.retain(|&c| c != id);
        }
        let subtree = self.walk(id);
        for &node in subtree.iter().rev() {
            if let Some(mut entry) = self.entries[node.index()].take() {
                entry.control.on_destroy();
            }
        }
    }

    /// Number of live controls.
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Check whether the arena holds no live controls.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ControlArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self
            .entries
            .iter()
            .flatten()
            .map(|e| e.control_id.as_str())
            .collect();
        f.debug_struct("ControlArena").field("controls", &ids).finish()
    }
}
