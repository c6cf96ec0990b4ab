#![forbid(unsafe_code)]

use rb_core::graph::{Connection, GraphState, Node};

/// Read-only view of the working graph handed to the rendering
/// collaborator after every mutation. Connections with a dangling
/// endpoint are already filtered out.
pub struct RenderView<'a> {
    nodes: &'a [Node],
    connections: Vec<&'a Connection>,
}

impl<'a> RenderView<'a> {
    pub fn of(graph: &'a GraphState) -> Self {
        Self {
            nodes: &graph.nodes,
            connections: graph.renderable_connections().collect(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        self.nodes
    }

    pub fn connections(&self) -> &[&Connection] {
        &self.connections
    }
}

/// The external rendering collaborator contract: a single entry point
/// invoked after every mutation.
pub trait Renderer {
    fn render_all(&mut self, view: RenderView<'_>);
}

/// Renderer for headless use.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_all(&mut self, _view: RenderView<'_>) {}
}

/// Records how often rendering was requested; handy in tests asserting
/// the mutate-save-render cycle.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    pub renders: usize,
}

impl Renderer for CountingRenderer {
    fn render_all(&mut self, _view: RenderView<'_>) {
        self.renders += 1;
    }
}
