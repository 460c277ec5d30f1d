use generational_arena::{Arena, Index};

use crate::resource_manager::model::ModelInstance;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct SceneNodeId(pub Index);
impl From<SceneNodeId> for Index {
    fn from(id: SceneNodeId) -> Self {
        id.0
    }
}

pub struct Node {
    pub instance: ModelInstance,
}

/// Model instances currently mounted, shared by all viewers of a page
#[derive(Default)]
pub struct Scene {
    pub nodes: Arena<Node>,
}
impl Scene {
    pub fn insert(&mut self, instance: ModelInstance) -> SceneNodeId {
        SceneNodeId(self.nodes.insert(Node { instance }))
    }

    pub fn remove(&mut self, id: SceneNodeId) -> Option<ModelInstance> {
        self.nodes.remove(id.into()).map(|node| node.instance)
    }

    pub fn get(&self, id: SceneNodeId) -> Option<&ModelInstance> {
        self.nodes.get(id.into()).map(|node| &node.instance)
    }

    pub fn get_mut(&mut self, id: SceneNodeId) -> Option<&mut ModelInstance> {
        self.nodes.get_mut(id.into()).map(|node| &mut node.instance)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
