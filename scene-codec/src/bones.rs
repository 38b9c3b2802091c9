//! Bone hierarchy reconstruction for avatar decoding
//!
//! Skin payloads name each bone and its parent, and a parent may be declared
//! after its child or by a different skin. Decoding therefore collects every
//! node of one avatar in a [`BoneGroup`]: an arena indexed by [`NodeId`] with a
//! `name -> node` map. Bones whose parent is not known yet go into a deferred
//! table that [`BoneGroup::reconcile`] resolves once the whole file is read.
//!
//! The group lives for a single decode call; nothing is shared between files.

use hashbrown::HashMap;
use scene_common::{Bone, FormatError, SceneNode, SkinnedMesh, Transform};
use tracing::{debug, warn};

use crate::container::MAX_NESTING_DEPTH;

/// Index of a node inside a [`BoneGroup`]
pub type NodeId = usize;

#[derive(Debug)]
struct GroupNode {
    /// Node payload; `children` stays empty until [`BoneGroup::into_tree`]
    node: SceneNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Named by a skin's bone list
    is_bone: bool,
}

/// All nodes of one decoded avatar, addressable by name
#[derive(Debug)]
pub struct BoneGroup {
    nodes: Vec<GroupNode>,
    by_name: HashMap<String, NodeId>,
    /// bone name -> parent name, for parents not seen yet
    deferred: HashMap<String, String>,
    /// Insertion order of `deferred`
    deferred_order: Vec<String>,
    /// (skinned node, root bone name) pairs checked after reconciliation
    root_bones: Vec<(NodeId, String)>,
}

impl BoneGroup {
    /// Root id of every group
    pub const ROOT: NodeId = 0;

    /// Start a group with `root` registered under its name
    pub fn new(root: SceneNode) -> Self {
        let mut group = Self {
            nodes: Vec::new(),
            by_name: HashMap::new(),
            deferred: HashMap::new(),
            deferred_order: Vec::new(),
            root_bones: Vec::new(),
        };
        group.create(root);
        group
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node registered under `name`
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    fn create(&mut self, node: SceneNode) -> NodeId {
        let id = self.nodes.len();
        self.by_name.entry(node.name.clone()).or_insert(id);
        self.nodes.push(GroupNode {
            node,
            parent: None,
            children: Vec::new(),
            is_bone: false,
        });
        id
    }

    /// Add a direct child of the root.
    ///
    /// A bone already registered under the same name is reused: it moves
    /// under the root and takes `transform`. Any other name clash gets a
    /// fresh node, since node names are not unique.
    pub fn add_root_child(
        &mut self,
        name: &str,
        transform: Transform,
    ) -> Result<NodeId, FormatError> {
        let bone = self.find(name).filter(|&id| self.nodes[id].is_bone);
        let id = match bone {
            Some(existing) => {
                debug!("Root child '{}' reuses an existing node", name);
                self.nodes[existing].node.transform = transform;
                existing
            }
            None => self.create(SceneNode::new(name).with_transform(transform)),
        };
        self.attach(id, Self::ROOT)?;
        Ok(id)
    }

    /// Attach a skin to `id` and remember its root bone for [`Self::reconcile`]
    pub fn set_skin(&mut self, id: NodeId, skin: SkinnedMesh) {
        let node = &mut self.nodes[id].node;
        if node.skin.is_some() {
            warn!("Node '{}' has more than one skin, keeping the last", node.name);
        }
        self.root_bones.retain(|(node_id, _)| *node_id != id);
        self.root_bones.push((id, skin.root_bone.clone()));
        node.skin = Some(skin);
    }

    /// Register every bone of one skin, attaching those whose parent exists
    pub fn resolve_bones(&mut self, bones: &[Bone]) -> Result<(), FormatError> {
        for bone in bones {
            let id = match self.find(&bone.name) {
                Some(existing) => existing,
                None => self.create(SceneNode::new(&bone.name).with_transform(bone.transform)),
            };
            self.nodes[id].is_bone = true;

            match self.find(&bone.parent) {
                Some(parent) => {
                    self.attach(id, parent)?;
                    self.deferred.remove(&bone.name);
                }
                None if !self.deferred.contains_key(&bone.name) => {
                    self.deferred.insert(bone.name.clone(), bone.parent.clone());
                    self.deferred_order.push(bone.name.clone());
                }
                // First deferred parent per bone wins
                None => {}
            }
        }
        Ok(())
    }

    /// Resolve the deferred table and check every root bone
    pub fn reconcile(&mut self) -> Result<(), FormatError> {
        let order = std::mem::take(&mut self.deferred_order);
        for bone in order {
            let Some(parent_name) = self.deferred.remove(&bone) else {
                continue;
            };
            let parent = self.find(&parent_name).ok_or_else(|| FormatError::DanglingBone {
                bone: bone.clone(),
                parent: parent_name.clone(),
            })?;
            let id = self.find(&bone).ok_or_else(|| FormatError::DanglingBone {
                bone: bone.clone(),
                parent: parent_name.clone(),
            })?;
            self.attach(id, parent)?;
        }

        for (id, root_bone) in &self.root_bones {
            if self.find(root_bone).is_none() {
                return Err(FormatError::DanglingRootBone {
                    node: self.nodes[*id].node.name.clone(),
                    root_bone: root_bone.clone(),
                });
            }
        }
        Ok(())
    }

    /// Move `child` under `parent`, detaching it from any previous parent
    fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), FormatError> {
        if self.nodes[child].parent == Some(parent) {
            return Ok(());
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(FormatError::BoneCycle {
                bone: self.nodes[child].node.name.clone(),
                parent: self.nodes[parent].node.name.clone(),
            });
        }

        if let Some(previous) = self.nodes[child].parent {
            self.nodes[previous].children.retain(|&c| c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Convert the arena into an owned tree rooted at [`Self::ROOT`]
    pub fn into_tree(self) -> Result<SceneNode, FormatError> {
        let mut slots: Vec<Option<GroupNode>> = self.nodes.into_iter().map(Some).collect();
        build(&mut slots, Self::ROOT, 0)
    }
}

fn build(
    slots: &mut [Option<GroupNode>],
    id: NodeId,
    depth: usize,
) -> Result<SceneNode, FormatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(FormatError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    // Every node has at most one parent, so each slot is taken once
    let Some(entry) = slots[id].take() else {
        return Err(FormatError::NestingTooDeep(MAX_NESTING_DEPTH));
    };
    let mut node = entry.node;
    node.children = entry
        .children
        .into_iter()
        .map(|child| build(slots, child, depth + 1))
        .collect::<Result<_, _>>()?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn bone(name: &str, parent: &str) -> Bone {
        Bone {
            name: name.into(),
            parent: parent.into(),
            transform: Transform::from_position(Vec3::Y),
        }
    }

    fn names(node: &SceneNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    fn group_with_armature() -> BoneGroup {
        let mut group = BoneGroup::new(SceneNode::new("Avatar"));
        group.add_root_child("Armature", Transform::IDENTITY).unwrap();
        group
    }

    #[test]
    fn test_parent_first_attaches_immediately() {
        let mut group = group_with_armature();
        group
            .resolve_bones(&[bone("Hips", "Armature"), bone("Spine", "Hips")])
            .unwrap();
        group.reconcile().unwrap();

        let tree = group.into_tree().unwrap();
        let hips = tree.find("Hips").unwrap();
        assert_eq!(names(hips), ["Spine"]);
        assert_eq!(hips.transform.position, Vec3::Y);
    }

    #[test]
    fn test_child_before_parent_is_deferred() {
        let mut group = group_with_armature();
        group
            .resolve_bones(&[
                bone("Hand", "Arm"),
                bone("Arm", "Shoulder"),
                bone("Shoulder", "Armature"),
            ])
            .unwrap();
        group.reconcile().unwrap();

        let tree = group.into_tree().unwrap();
        assert_eq!(tree.node_count(), 5);
        assert_eq!(names(tree.find("Armature").unwrap()), ["Shoulder"]);
        assert_eq!(names(tree.find("Shoulder").unwrap()), ["Arm"]);
        assert_eq!(names(tree.find("Arm").unwrap()), ["Hand"]);
    }

    #[test]
    fn test_bones_shared_between_skins_are_reused() {
        let mut group = group_with_armature();
        group
            .resolve_bones(&[bone("Hips", "Armature"), bone("Head", "Hips")])
            .unwrap();
        group
            .resolve_bones(&[bone("Hips", "Armature"), bone("Hair", "Head")])
            .unwrap();
        group.reconcile().unwrap();

        assert_eq!(group.len(), 5);
        let tree = group.into_tree().unwrap();
        let mut hips = Vec::new();
        tree.walk(&mut |n| {
            if n.name == "Hips" {
                hips.push(n);
            }
        });
        assert_eq!(hips.len(), 1);
        assert_eq!(names(tree.find("Head").unwrap()), ["Hair"]);
    }

    #[test]
    fn test_missing_parent_is_dangling() {
        let mut group = group_with_armature();
        group.resolve_bones(&[bone("Tail", "Pelvis")]).unwrap();
        let err = group.reconcile().unwrap_err();
        assert_eq!(
            err,
            FormatError::DanglingBone {
                bone: "Tail".into(),
                parent: "Pelvis".into()
            }
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut group = group_with_armature();
        group.resolve_bones(&[bone("A", "B"), bone("B", "A")]).unwrap();
        let err = group.reconcile().unwrap_err();
        assert!(matches!(err, FormatError::BoneCycle { .. }));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let mut group = group_with_armature();
        let err = group.resolve_bones(&[bone("Armature", "Armature")]).unwrap_err();
        assert!(matches!(err, FormatError::BoneCycle { .. }));
    }

    #[test]
    fn test_immediate_attach_clears_deferred_entry() {
        let mut group = group_with_armature();
        group.resolve_bones(&[bone("Hips", "Ghost")]).unwrap();
        group.resolve_bones(&[bone("Hips", "Armature")]).unwrap();
        group.reconcile().unwrap();
        let tree = group.into_tree().unwrap();
        assert_eq!(names(tree.find("Armature").unwrap()), ["Hips"]);
    }

    #[test]
    fn test_root_child_reuses_bone_node() {
        let mut group = BoneGroup::new(SceneNode::new("Avatar"));
        group
            .resolve_bones(&[bone("Hips", "Armature"), bone("Armature", "Avatar")])
            .unwrap();
        let armature = group
            .add_root_child("Armature", Transform::from_position(Vec3::X))
            .unwrap();
        group.reconcile().unwrap();

        assert_eq!(group.parent(armature), Some(BoneGroup::ROOT));
        assert_eq!(group.len(), 3);
        let tree = group.into_tree().unwrap();
        assert_eq!(names(&tree), ["Armature"]);
        assert_eq!(tree.children[0].transform.position, Vec3::X);
        assert_eq!(names(&tree.children[0]), ["Hips"]);
    }

    #[test]
    fn test_same_named_root_children_stay_apart() {
        let mut group = BoneGroup::new(SceneNode::new("Avatar"));
        let first = group.add_root_child("Mesh", Transform::IDENTITY).unwrap();
        let second = group
            .add_root_child("Mesh", Transform::from_position(Vec3::X))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(group.find("Mesh"), Some(first));

        group.reconcile().unwrap();
        let tree = group.into_tree().unwrap();
        assert_eq!(names(&tree), ["Mesh", "Mesh"]);
        assert_eq!(tree.children[1].transform.position, Vec3::X);
    }

    #[test]
    fn test_missing_root_bone() {
        let mut group = group_with_armature();
        let body = group.add_root_child("Body", Transform::IDENTITY).unwrap();
        group.set_skin(
            body,
            SkinnedMesh {
                root_bone: "Hips".into(),
                ..Default::default()
            },
        );
        let err = group.reconcile().unwrap_err();
        assert_eq!(
            err,
            FormatError::DanglingRootBone {
                node: "Body".into(),
                root_bone: "Hips".into()
            }
        );
    }
}
