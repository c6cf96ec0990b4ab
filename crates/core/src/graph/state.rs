#![forbid(unsafe_code)]

use super::{
    Connection, NODE_HEIGHT, NODE_WIDTH, Node, NodeIdGen, PROGRESS_STEPS, default_progress,
    normalize_color,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    UnknownNode,
    UnknownConnection,
    SelfLoop,
    DuplicateConnection,
    NodeLocked,
    AllLocked,
    ProgressIndexOutOfRange,
    NoActiveDrag,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::UnknownNode => "unknown node",
            Self::UnknownConnection => "unknown connection",
            Self::SelfLoop => "a node cannot be connected to itself",
            Self::DuplicateConnection => "connection already exists",
            Self::NodeLocked => "node is locked",
            Self::AllLocked => "all nodes are locked",
            Self::ProgressIndexOutOfRange => "progress index out of range",
            Self::NoActiveDrag => "no drag in progress",
        };
        f.write_str(message)
    }
}

impl std::error::Error for GraphError {}

/// Canvas extent the drag clamp works against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
}

impl CanvasBounds {
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        let max_x = (self.width - NODE_WIDTH).max(0.0);
        let max_y = (self.height - NODE_HEIGHT).max(0.0);
        (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
    }
}

#[derive(Clone, Debug)]
pub struct NodeRemoval {
    pub node: Node,
    pub removed_connections: usize,
}

#[derive(Clone, Debug)]
pub struct ConnectionRemoval {
    pub connection: Connection,
    pub from_title: Option<String>,
    pub to_title: Option<String>,
}

impl ConnectionRemoval {
    /// Endpoint titles, when both ends still resolve to nodes.
    pub fn endpoint_titles(&self) -> Option<(&str, &str)> {
        match (&self.from_title, &self.to_title) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockOutcome {
    /// The node's lock flag after the toggle.
    pub locked: bool,
    /// The global lock was engaged and has been released by this toggle.
    pub global_released: bool,
    /// Every node is now individually locked; the caller may offer to
    /// engage the global lock (confirmation happens at the boundary).
    pub all_nodes_now_locked: bool,
}

#[derive(Debug)]
struct DragGesture {
    node_id: String,
}

/// The working copy of one roadmap's graph, checked out from exactly
/// one stored document at a time.
#[derive(Debug, Default)]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    all_locked: bool,
    id_gen: NodeIdGen,
    drag: Option<DragGesture>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the working copy wholesale (load, import-merge,
    /// template application). Any drag in progress is abandoned.
    pub fn reset(&mut self, nodes: Vec<Node>, connections: Vec<Connection>) {
        self.nodes = nodes;
        self.connections = connections;
        self.drag = None;
    }

    pub fn all_locked(&self) -> bool {
        self.all_locked
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    pub fn node_title(&self, node_id: &str) -> Option<String> {
        self.node(node_id).map(|n| n.title.clone())
    }

    /// Connections whose endpoints both resolve. Dangling connections
    /// are tolerated in storage but skipped by rendering.
    pub fn renderable_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| self.node(&c.from_id).is_some() && self.node(&c.to_id).is_some())
    }

    pub fn add_node(
        &mut self,
        title: &str,
        description: &str,
        x: f64,
        y: f64,
        color: &str,
        now_ms: i64,
    ) -> Node {
        let id = self.id_gen.next(now_ms);
        let node = Node::new(id, title, description, x, y, color);
        self.nodes.push(node.clone());
        node
    }

    /// Removes the node and every connection incident to it as one
    /// step. The caller boundary confirms before invoking.
    pub fn delete_node(&mut self, node_id: &str) -> Result<NodeRemoval, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or(GraphError::UnknownNode)?;
        let node = self.nodes.remove(index);
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(node_id));
        if self
            .drag
            .as_ref()
            .is_some_and(|gesture| gesture.node_id == node_id)
        {
            self.drag = None;
        }
        Ok(NodeRemoval {
            node,
            removed_connections: before - self.connections.len(),
        })
    }

    pub fn create_connection(
        &mut self,
        from_id: &str,
        to_id: &str,
    ) -> Result<Connection, GraphError> {
        if from_id == to_id {
            return Err(GraphError::SelfLoop);
        }
        if self.node(from_id).is_none() || self.node(to_id).is_none() {
            return Err(GraphError::UnknownNode);
        }
        if self.connections.iter().any(|c| c.links(from_id, to_id)) {
            return Err(GraphError::DuplicateConnection);
        }
        let connection = Connection::new(from_id, to_id);
        self.connections.push(connection.clone());
        Ok(connection)
    }

    pub fn delete_connection(&mut self, conn_id: &str) -> Result<ConnectionRemoval, GraphError> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == conn_id)
            .ok_or(GraphError::UnknownConnection)?;
        let connection = self.connections.remove(index);
        Ok(ConnectionRemoval {
            from_title: self.node_title(&connection.from_id),
            to_title: self.node_title(&connection.to_id),
            connection,
        })
    }

    /// Monotonic "fill up to index" scale. Clicking square 0 while it
    /// is active clears the whole scale; any other click sets the
    /// filled prefix to end exactly at `index`. Returns the resulting
    /// filled count.
    pub fn toggle_progress_square(
        &mut self,
        node_id: &str,
        index: usize,
    ) -> Result<usize, GraphError> {
        if index >= PROGRESS_STEPS {
            return Err(GraphError::ProgressIndexOutOfRange);
        }
        let node = self.node_mut(node_id).ok_or(GraphError::UnknownNode)?;
        if node.locked {
            return Err(GraphError::NodeLocked);
        }
        if index == 0 && node.progress[0] == 1 {
            node.progress = default_progress();
        } else {
            for (i, square) in node.progress.iter_mut().enumerate() {
                *square = if i <= index { 1 } else { 0 };
            }
        }
        Ok(node.progress_level())
    }

    pub fn toggle_lock_node(&mut self, node_id: &str) -> Result<LockOutcome, GraphError> {
        let global_released = self.all_locked;
        self.all_locked = false;

        let node = self.node_mut(node_id).ok_or(GraphError::UnknownNode)?;
        node.locked = !node.locked;
        let locked = node.locked;

        // Only offered when the global lock was not the thing just
        // released; mirrors the two branches of the original toggle.
        let all_nodes_now_locked = !global_released
            && !self.nodes.is_empty()
            && self.nodes.iter().all(|n| n.locked);

        Ok(LockOutcome {
            locked,
            global_released,
            all_nodes_now_locked,
        })
    }

    /// Flips the global lock; returns the new state. While engaged,
    /// every drag is refused regardless of per-node flags.
    pub fn toggle_lock_all(&mut self) -> bool {
        self.all_locked = !self.all_locked;
        if self.all_locked {
            self.drag = None;
        }
        self.all_locked
    }

    pub fn begin_drag(&mut self, node_id: &str) -> Result<(), GraphError> {
        if self.all_locked {
            return Err(GraphError::AllLocked);
        }
        let node = self.node(node_id).ok_or(GraphError::UnknownNode)?;
        if node.locked {
            return Err(GraphError::NodeLocked);
        }
        self.drag = Some(DragGesture {
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    /// One pointer-move event: clamps into the canvas and updates the
    /// in-memory position. Nothing is persisted until the drag ends.
    pub fn drag_to(&mut self, x: f64, y: f64, canvas: CanvasBounds) -> Result<(), GraphError> {
        if self.all_locked {
            self.drag = None;
            return Err(GraphError::AllLocked);
        }
        let node_id = match &self.drag {
            Some(gesture) => gesture.node_id.clone(),
            None => return Err(GraphError::NoActiveDrag),
        };
        let (x, y) = canvas.clamp(x, y);
        let node = self.node_mut(&node_id).ok_or(GraphError::UnknownNode)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Releasing the pointer is the only way to end the gesture.
    /// Returns the dragged node's id so the caller can commit.
    pub fn end_drag(&mut self) -> Option<String> {
        self.drag.take().map(|gesture| gesture.node_id)
    }

    pub fn edit_node(
        &mut self,
        node_id: &str,
        title: &str,
        description: &str,
        color: &str,
    ) -> Result<Node, GraphError> {
        let color = normalize_color(color);
        let node = self.node_mut(node_id).ok_or(GraphError::UnknownNode)?;
        node.title = title.trim().to_string();
        node.description = description.trim().to_string();
        node.color = color;
        Ok(node.clone())
    }
}
