use crate::constants;
use crate::geom::{BoundsShape, Rect};

/// Stable identity of an entry in a Quadtree. Ids are vended by the owner of the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadtreeData {
    pub id: ObjectId,
    pub bounds: BoundsShape,
}

#[derive(Copy, Clone, Debug)]
pub struct QuadtreeConfig {
    /// A leaf holding more entries than this splits into four children.
    pub max_objects_per_node: usize,
    /// Nodes at this depth never split.
    pub max_depth: usize,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_objects_per_node: constants::QUADTREE_MAX_OBJECTS_PER_NODE,
            max_depth: constants::QUADTREE_MAX_DEPTH,
        }
    }
}

#[derive(Debug)]
struct Node {
    bounds: Rect,
    depth: usize,
    contents: Vec<QuadtreeData>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            contents: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, data: QuadtreeData, config: &QuadtreeConfig) {
        if let Some(children) = &mut self.children {
            let rect = data.bounds.bounding_rect();
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains_rect(&rect)) {
                child.insert(data, config);
            } else {
                // spans more than one child, stays here
                self.contents.push(data);
            }
            return;
        }

        self.contents.push(data);
        if self.contents.len() > config.max_objects_per_node && self.depth < config.max_depth {
            self.split(config);
        }
    }

    fn split(&mut self, config: &QuadtreeConfig) {
        let [q0, q1, q2, q3] = self.bounds.quadrants();
        let depth = self.depth + 1;
        let mut children = Box::new([
            Node::new(q0, depth),
            Node::new(q1, depth),
            Node::new(q2, depth),
            Node::new(q3, depth),
        ]);

        let contents = std::mem::take(&mut self.contents);
        for data in contents {
            let rect = data.bounds.bounding_rect();
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains_rect(&rect)) {
                child.insert(data, config);
            } else {
                self.contents.push(data);
            }
        }

        self.children = Some(children);
    }

    fn query<'a>(&'a self, shape: &BoundsShape, results: &mut Vec<&'a QuadtreeData>) {
        for data in &self.contents {
            if shape.intersects(&data.bounds) {
                results.push(data);
            }
        }

        if let Some(children) = &self.children {
            // circles count as touching at distance == radius, so skip only what can't be reached
            let reach = shape.bounding_rect();
            for child in children.iter() {
                if reach.touches(&child.bounds) {
                    child.query(shape, results);
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(|n| n.node_count()).sum())
    }
}

/// Region quadtree over a fixed boundary. Entries which fit entirely inside one child
/// quadrant live in that child; entries spanning quadrants live in the smallest node
/// containing them. Entries extending past the boundary live in the root.
#[derive(Debug)]
pub struct Quadtree {
    root: Node,
    config: QuadtreeConfig,
    len: usize,
}

impl Quadtree {
    pub fn new(boundary: Rect) -> Self {
        Self::with_config(boundary, QuadtreeConfig::default())
    }

    pub fn with_config(boundary: Rect, config: QuadtreeConfig) -> Self {
        Self {
            root: Node::new(boundary, 0),
            config,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes in the tree, including the root.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn insert(&mut self, data: QuadtreeData) {
        if !self.root.bounds.contains_rect(&data.bounds.bounding_rect()) {
            log::debug!(
                "Quadtree::insert - {:?} extends past boundary {:?}, storing at root",
                data.id,
                self.root.bounds
            );
        }
        self.root.insert(data, &self.config);
        self.len += 1;
    }

    /// Returns every entry whose bounds intersect `shape`, in no particular order.
    pub fn query(&self, shape: &BoundsShape) -> Vec<&QuadtreeData> {
        let mut results = Vec::new();
        self.root.query(shape, &mut results);
        results
    }
}
