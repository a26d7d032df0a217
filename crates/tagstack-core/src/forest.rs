//! Owner-scoped tag forest read model.
//!
//! Tags only store a parent id. `TagForest` indexes one owner's tags by id
//! and derives the children relation, so every tree walk (root finding,
//! descendant tests, subtree rendering) runs against a single consistent
//! snapshot. All walks carry a visited set and stop on a revisit, even though
//! writes never let a cycle in.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Tag, TagNode};

/// Index over one owner's tags.
#[derive(Debug, Clone, Default)]
pub struct TagForest {
    tags: HashMap<Uuid, Tag>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
}

impl TagForest {
    /// Build the index. Siblings and roots are ordered by name, then id.
    ///
    /// A tag whose parent is not part of the set is treated as a root.
    pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
        let tags: HashMap<Uuid, Tag> = tags.into_iter().map(|t| (t.id, t)).collect();
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut roots = Vec::new();

        for tag in tags.values() {
            match tag.parent_id {
                Some(parent) if tags.contains_key(&parent) => {
                    children.entry(parent).or_default().push(tag.id)
                }
                _ => roots.push(tag.id),
            }
        }

        let order = |a: &Uuid, b: &Uuid| tags[a].name.cmp(&tags[b].name).then(a.cmp(b));
        roots.sort_by(|a, b| order(a, b));
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| order(a, b));
        }

        Self {
            tags,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.tags.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// All tags, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Parent of `id`, if it has one inside this forest.
    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.tags
            .get(&id)?
            .parent_id
            .filter(|parent| self.tags.contains_key(parent))
    }

    /// Direct children of `id`, ordered by name.
    pub fn children_of(&self, id: Uuid) -> impl Iterator<Item = &Tag> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.tags.get(child))
    }

    /// Root tags, ordered by name.
    pub fn roots(&self) -> impl Iterator<Item = &Tag> {
        self.roots.iter().filter_map(|id| self.tags.get(id))
    }

    /// Ids from the forest root down to `id`, inclusive.
    ///
    /// Returns `None` if `id` is unknown or its parent chain revisits a node.
    pub fn path_from_root(&self, id: Uuid) -> Option<Vec<Uuid>> {
        if !self.contains(id) {
            return None;
        }

        let mut path = vec![id];
        let mut visited: HashSet<Uuid> = HashSet::from([id]);
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if !visited.insert(parent) {
                warn!(
                    subsystem = "hierarchy",
                    component = "forest",
                    tag_id = %id,
                    "Parent chain revisits a tag; ignoring it"
                );
                return None;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Root of the tree containing `id`.
    pub fn root_of(&self, id: Uuid) -> Option<Uuid> {
        self.path_from_root(id)
            .and_then(|path| path.first().copied())
    }

    /// Whether `candidate` lies strictly below `ancestor`.
    pub fn is_strict_descendant(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.parent_of(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Every tag strictly below `id`, breadth-first.
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([id]);
        let mut queue: VecDeque<Uuid> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children.get(&current).into_iter().flatten() {
                if visited.insert(*child) {
                    out.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        out
    }

    /// Check that `tag_id` may be moved under `new_parent`.
    ///
    /// `None` (detach to root) is always allowed. Otherwise the parent must be
    /// a different tag of this forest that is not below `tag_id`.
    pub fn validate_reparent(&self, tag_id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        let Some(parent_id) = new_parent else {
            return Ok(());
        };
        if parent_id == tag_id {
            return Err(Error::SelfParent(tag_id));
        }
        if !self.contains(parent_id) {
            return Err(Error::InvalidParent(parent_id));
        }

        // Walk up from the proposed parent: meeting tag_id means the parent
        // is one of its descendants.
        let mut visited = HashSet::new();
        let mut current = Some(parent_id);
        while let Some(id) = current {
            if id == tag_id || !visited.insert(id) {
                return Err(Error::HierarchyCycle { tag_id, parent_id });
            }
            current = self.parent_of(id);
        }
        Ok(())
    }

    /// Full subtree rooted at `id`.
    pub fn subtree(&self, id: Uuid) -> Option<TagNode> {
        self.assemble(id, &|_| true, &mut HashSet::new())
    }

    /// Every tree of the forest, ordered by root name.
    pub fn trees(&self) -> Vec<TagNode> {
        let mut visited = HashSet::new();
        self.roots
            .iter()
            .filter_map(|root| self.assemble(*root, &|_| true, &mut visited))
            .collect()
    }

    /// Render the tree under `id`, keeping only children accepted by `keep`.
    ///
    /// Nodes are collected depth-first with an explicit stack, then attached
    /// to their parents from the deepest up, so chain depth never grows the
    /// call stack.
    pub(crate) fn assemble<F>(&self, id: Uuid, keep: &F, visited: &mut HashSet<Uuid>) -> Option<TagNode>
    where
        F: Fn(Uuid) -> bool,
    {
        let tag = self.tags.get(&id)?;
        if !visited.insert(id) {
            return None;
        }

        // Pre-order list of nodes with the index of their parent entry.
        let mut order: Vec<(TagNode, usize)> = vec![(TagNode::leaf(tag), 0)];
        let mut pending: Vec<(Uuid, usize)> = Vec::new();
        self.push_children(id, 0, keep, &mut pending);

        while let Some((child, parent)) = pending.pop() {
            if !visited.insert(child) {
                continue;
            }
            let Some(tag) = self.tags.get(&child) else {
                continue;
            };
            order.push((TagNode::leaf(tag), parent));
            self.push_children(child, order.len() - 1, keep, &mut pending);
        }

        // Every child sits after its parent, so popping from the back
        // completes each node before it is attached. Children arrive in
        // reverse sibling order.
        while order.len() > 1 {
            let Some((mut node, parent)) = order.pop() else {
                break;
            };
            node.children.reverse();
            order[parent].0.children.push(node);
        }
        let (mut root, _) = order.pop()?;
        root.children.reverse();
        Some(root)
    }

    fn push_children<F>(&self, id: Uuid, index: usize, keep: &F, pending: &mut Vec<(Uuid, usize)>)
    where
        F: Fn(Uuid) -> bool,
    {
        // Reversed so the first sibling is popped first.
        for child in self.children.get(&id).into_iter().flatten().rev() {
            if keep(*child) {
                pending.push((*child, index));
            }
        }
    }
}
