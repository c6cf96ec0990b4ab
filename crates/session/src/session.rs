#![forbid(unsafe_code)]

use crate::autosave::AutosaveTimer;
use crate::render::{RenderView, Renderer};
use crate::routing::{page_title, resolve_fragment};
use crate::templates::{Template, template_data};
use crate::transfer::{
    ExportFile, ImportDecision, export_document_json, export_notes_html, generated_import_id,
    parse_import,
};
use rb_core::graph::{
    CanvasBounds, ConnectMode, ConnectSelect, Connection, ConnectionRemoval, GraphError,
    GraphState, LockOutcome, Node, NodeRemoval,
};
use rb_core::ids::{RoadmapId, RoadmapIdError};
use rb_storage::{
    DocumentStore, IndexEntry, KvStore, MAX_FONT_SIZE, MIN_FONT_SIZE, RoadmapDocument,
    RoadmapIndex, StoreError, ts_ms_to_rfc3339,
};

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Graph(GraphError),
    InvalidId(RoadmapIdError),
    /// Deleting the currently active roadmap is rejected before it
    /// reaches the store.
    ActiveRoadmap,
    ImportParse(serde_json::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "storage: {err}"),
            Self::Graph(err) => write!(f, "graph: {err}"),
            Self::InvalidId(err) => f.write_str(err.message()),
            Self::ActiveRoadmap => {
                f.write_str("cannot delete the active roadmap; switch to another one first")
            }
            Self::ImportParse(err) => write!(f, "import file is not valid JSON: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<GraphError> for SessionError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<RoadmapIdError> for SessionError {
    fn from(value: RoadmapIdError) -> Self {
        Self::InvalidId(value)
    }
}

/// Outcome of clicking a node, shaped by the connection-mode state
/// machine.
#[derive(Debug)]
pub enum NodeClick {
    /// Connection mode is off; an ordinary selection.
    Selected,
    /// First endpoint recorded, waiting for the second.
    ConnectStarted,
    /// Same node picked twice; still waiting for a distinct node.
    SameNodeRejected,
    Connected(Connection),
    ConnectFailed(GraphError),
}

#[derive(Debug)]
pub enum ImportResult {
    /// Stored as a new roadmap; the caller navigates to the id.
    LoadedAsNew(RoadmapId),
    /// Merged into the currently open roadmap.
    Merged,
}

/// One open tab's worth of editor state: the active roadmap id, the
/// working graph copy, the notepad, and the autosave timer. Every
/// successful mutation persists the document and asks the rendering
/// collaborator to redraw.
pub struct Session<R: Renderer> {
    kv: KvStore,
    renderer: R,
    current_id: RoadmapId,
    graph: GraphState,
    connect: ConnectMode,
    notepad: String,
    notepad_font_size: u32,
    autosave: AutosaveTimer,
}

impl<R: Renderer> Session<R> {
    /// Resolves the URL fragment, loads (migrating if needed) the
    /// document, and renders the initial view.
    pub fn open(
        kv: KvStore,
        renderer: R,
        fragment: &str,
        now_ms: i64,
    ) -> Result<Self, SessionError> {
        let current_id = resolve_fragment(fragment);
        let mut session = Self {
            kv,
            renderer,
            current_id: current_id.clone(),
            graph: GraphState::new(),
            connect: ConnectMode::default(),
            notepad: String::new(),
            notepad_font_size: rb_storage::DEFAULT_FONT_SIZE,
            autosave: AutosaveTimer::new(),
        };
        session.checkout(&current_id, now_ms)?;
        session.render();
        Ok(session)
    }

    pub fn current_id(&self) -> &RoadmapId {
        &self.current_id
    }

    pub fn page_title(&self) -> String {
        page_title(&self.current_id)
    }

    pub fn graph(&self) -> &GraphState {
        &self.graph
    }

    pub fn notepad(&self) -> &str {
        &self.notepad
    }

    pub fn notepad_font_size(&self) -> u32 {
        self.notepad_font_size
    }

    pub fn connect_mode(&self) -> &ConnectMode {
        &self.connect
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    // ---- graph mutations -------------------------------------------------

    pub fn add_node(
        &mut self,
        title: &str,
        description: &str,
        x: f64,
        y: f64,
        color: &str,
        now_ms: i64,
    ) -> Node {
        let node = self.graph.add_node(title, description, x, y, color, now_ms);
        self.persist(now_ms);
        self.render();
        node
    }

    pub fn edit_node(
        &mut self,
        node_id: &str,
        title: &str,
        description: &str,
        color: &str,
        now_ms: i64,
    ) -> Result<Node, SessionError> {
        let node = self.graph.edit_node(node_id, title, description, color)?;
        self.persist(now_ms);
        self.render();
        Ok(node)
    }

    /// The caller boundary has already confirmed the deletion.
    pub fn delete_node(&mut self, node_id: &str, now_ms: i64) -> Result<NodeRemoval, SessionError> {
        let removal = self.graph.delete_node(node_id)?;
        self.persist(now_ms);
        self.render();
        Ok(removal)
    }

    pub fn create_connection(
        &mut self,
        from_id: &str,
        to_id: &str,
        now_ms: i64,
    ) -> Result<Connection, SessionError> {
        let conn = self.graph.create_connection(from_id, to_id)?;
        self.persist(now_ms);
        self.render();
        Ok(conn)
    }

    pub fn delete_connection(
        &mut self,
        conn_id: &str,
        now_ms: i64,
    ) -> Result<ConnectionRemoval, SessionError> {
        let removal = self.graph.delete_connection(conn_id)?;
        self.persist(now_ms);
        self.render();
        Ok(removal)
    }

    pub fn toggle_connect_mode(&mut self) -> bool {
        self.connect.toggle()
    }

    /// A node was clicked; drives the two-click connection flow when
    /// connection mode is armed.
    pub fn click_node(&mut self, node_id: &str, now_ms: i64) -> NodeClick {
        match self.connect.select(node_id) {
            ConnectSelect::NotConnecting => NodeClick::Selected,
            ConnectSelect::FirstChosen => NodeClick::ConnectStarted,
            ConnectSelect::SameNode => NodeClick::SameNodeRejected,
            ConnectSelect::PairChosen { from, to } => {
                match self.graph.create_connection(&from, &to) {
                    Ok(conn) => {
                        self.persist(now_ms);
                        self.render();
                        NodeClick::Connected(conn)
                    }
                    Err(err) => NodeClick::ConnectFailed(err),
                }
            }
        }
    }

    /// A click outside any node or connection cancels an armed
    /// connection mode.
    pub fn click_outside(&mut self) {
        self.connect.cancel();
    }

    pub fn toggle_progress_square(
        &mut self,
        node_id: &str,
        index: usize,
        now_ms: i64,
    ) -> Result<usize, SessionError> {
        let level = self.graph.toggle_progress_square(node_id, index)?;
        self.persist(now_ms);
        self.render();
        Ok(level)
    }

    pub fn toggle_lock_node(
        &mut self,
        node_id: &str,
        now_ms: i64,
    ) -> Result<LockOutcome, SessionError> {
        let outcome = self.graph.toggle_lock_node(node_id)?;
        self.persist(now_ms);
        self.render();
        Ok(outcome)
    }

    pub fn toggle_lock_all(&mut self, now_ms: i64) -> bool {
        let engaged = self.graph.toggle_lock_all();
        self.persist(now_ms);
        self.render();
        engaged
    }

    pub fn begin_drag(&mut self, node_id: &str) -> Result<(), SessionError> {
        self.graph.begin_drag(node_id)?;
        Ok(())
    }

    /// Mid-drag moves update memory and redraw only; nothing persists
    /// until the pointer is released.
    pub fn drag_to(&mut self, x: f64, y: f64, canvas: CanvasBounds) -> Result<(), SessionError> {
        self.graph.drag_to(x, y, canvas)?;
        self.render();
        Ok(())
    }

    pub fn end_drag(&mut self, now_ms: i64) -> bool {
        if self.graph.end_drag().is_some() {
            self.persist(now_ms);
            self.render();
            true
        } else {
            false
        }
    }

    // ---- notepad & autosave ----------------------------------------------

    /// One notepad edit; resets the quiescence timer instead of writing
    /// immediately, so bursts of keystrokes coalesce.
    pub fn set_notepad(&mut self, content: &str, now_ms: i64) {
        self.notepad = content.to_string();
        self.autosave.schedule(now_ms);
    }

    /// Drives the autosave deadline; returns true when a save fired.
    pub fn poll_autosave(&mut self, now_ms: i64) -> bool {
        if self.autosave.poll(now_ms) {
            self.persist(now_ms);
            true
        } else {
            false
        }
    }

    /// Synchronous save regardless of timer state; used on unload and
    /// before any navigation.
    pub fn flush(&mut self, now_ms: i64) {
        self.autosave.cancel();
        self.persist(now_ms);
    }

    pub fn change_font_size(&mut self, delta: i32, now_ms: i64) -> u32 {
        let next = self.notepad_font_size as i64 + delta as i64;
        if (MIN_FONT_SIZE as i64..=MAX_FONT_SIZE as i64).contains(&next) {
            self.notepad_font_size = next as u32;
            self.autosave.schedule(now_ms);
        }
        self.notepad_font_size
    }

    /// The caller boundary has already confirmed.
    pub fn clear_notepad(&mut self, now_ms: i64) {
        self.notepad.clear();
        self.flush(now_ms);
    }

    /// Replaces the whole board with a built-in template. Destructive;
    /// the caller boundary has already confirmed.
    pub fn apply_template(&mut self, template: Template, now_ms: i64) {
        let data = template_data(template);
        self.graph.reset(data.nodes, data.connections);
        self.notepad.clear();
        self.persist(now_ms);
        self.render();
    }

    // ---- roadmap management ----------------------------------------------

    /// Fragment-change notification: saves the current document, then
    /// checks out whatever the fragment resolves to.
    pub fn navigate(&mut self, fragment: &str, now_ms: i64) -> Result<(), SessionError> {
        let target = resolve_fragment(fragment);
        self.switch_internal(target, now_ms)
    }

    /// Switches to another roadmap; a no-op when already current.
    /// Returns whether a switch happened.
    pub fn switch_roadmap(&mut self, id: &RoadmapId, now_ms: i64) -> Result<bool, SessionError> {
        if *id == self.current_id {
            return Ok(false);
        }
        self.switch_internal(id.clone(), now_ms)?;
        Ok(true)
    }

    pub fn roadmap_exists(&self, id: &RoadmapId) -> Result<bool, SessionError> {
        Ok(DocumentStore::new(&self.kv).exists(id)?)
    }

    /// Creates an empty roadmap under the id and switches to it. The
    /// caller boundary confirmed the creation when the id was new.
    pub fn create_and_switch(&mut self, raw_id: &str, now_ms: i64) -> Result<RoadmapId, SessionError> {
        let id = RoadmapId::try_new(raw_id)?;
        let store = DocumentStore::new(&self.kv);
        if !store.exists(&id)? {
            store.create_empty(&id, now_ms)?;
        }
        self.switch_roadmap(&id, now_ms)?;
        Ok(id)
    }

    pub fn duplicate_roadmap(
        &self,
        source: &RoadmapId,
        target: &RoadmapId,
        now_ms: i64,
    ) -> Result<bool, SessionError> {
        Ok(DocumentStore::new(&self.kv).duplicate(source, target, now_ms)?)
    }

    /// Renames a roadmap; the active one may be renamed, in which case
    /// the session follows the new id.
    pub fn rename_roadmap(
        &mut self,
        old: &RoadmapId,
        new: &RoadmapId,
        now_ms: i64,
    ) -> Result<bool, SessionError> {
        let renamed = DocumentStore::new(&self.kv).rename(old, new, now_ms)?;
        if renamed && *old == self.current_id {
            self.current_id = new.clone();
        }
        Ok(renamed)
    }

    pub fn delete_roadmap(&self, id: &RoadmapId) -> Result<(), SessionError> {
        if *id == self.current_id {
            return Err(SessionError::ActiveRoadmap);
        }
        DocumentStore::new(&self.kv).delete(id)?;
        Ok(())
    }

    /// Catalog for display: counts are re-derived defensively first,
    /// since they are updated opportunistically elsewhere.
    pub fn roadmaps(&self) -> Result<Vec<IndexEntry>, SessionError> {
        let index = RoadmapIndex::new(&self.kv);
        index.recalculate()?;
        Ok(index.list()?)
    }

    // ---- import / export -------------------------------------------------

    pub fn export_json(&self, now_ms: i64) -> ExportFile {
        let mut doc = self.snapshot();
        doc.last_modified = ts_ms_to_rfc3339(now_ms);
        doc.name = self.current_id.as_str().to_string();
        export_document_json(&doc, &self.current_id, now_ms)
    }

    pub fn export_notes_html(&self, now_ms: i64) -> ExportFile {
        export_notes_html(&self.notepad, self.notepad_font_size, now_ms)
    }

    /// Imports a previously exported file. `LoadAsNew` stores it under
    /// the id from the file (or a generated one) without leaving the
    /// current roadmap; `MergeIntoCurrent` replaces the working copy
    /// and saves (destructive; caller confirmed).
    pub fn import_json(
        &mut self,
        raw: &str,
        decision: ImportDecision,
        now_ms: i64,
    ) -> Result<ImportResult, SessionError> {
        let payload = parse_import(raw).map_err(SessionError::ImportParse)?;
        match decision {
            ImportDecision::LoadAsNew => {
                let id = payload
                    .roadmap_id
                    .unwrap_or_else(|| generated_import_id(now_ms));
                let mut doc = payload.document;
                DocumentStore::new(&self.kv).save(&id, &mut doc, now_ms)?;
                Ok(ImportResult::LoadedAsNew(id))
            }
            ImportDecision::MergeIntoCurrent => {
                let doc = payload.document;
                self.graph.reset(doc.nodes, doc.connections);
                if !doc.notepad.is_empty() {
                    self.notepad = doc.notepad;
                }
                if payload.has_font_size {
                    self.notepad_font_size = doc.notepad_font_size;
                }
                self.persist(now_ms);
                self.render();
                Ok(ImportResult::Merged)
            }
        }
    }

    // ---- internals -------------------------------------------------------

    fn snapshot(&self) -> RoadmapDocument {
        RoadmapDocument {
            nodes: self.graph.nodes.clone(),
            connections: self.graph.connections.clone(),
            notepad: self.notepad.clone(),
            notepad_font_size: self.notepad_font_size,
            ..RoadmapDocument::default()
        }
    }

    /// Serializes the working copy. Write failures are logged and
    /// swallowed: in-memory state stays the source of truth and the
    /// session remains usable.
    fn persist(&mut self, now_ms: i64) {
        let mut doc = self.snapshot();
        if let Err(err) = DocumentStore::new(&self.kv).save(&self.current_id, &mut doc, now_ms) {
            eprintln!("failed to save roadmap '{}': {err}", self.current_id);
        }
    }

    fn render(&mut self) {
        let view = RenderView::of(&self.graph);
        self.renderer.render_all(view);
    }

    fn switch_internal(&mut self, target: RoadmapId, now_ms: i64) -> Result<(), SessionError> {
        // Unsaved edits (including a pending autosave) are committed
        // before leaving the current roadmap.
        self.flush(now_ms);
        self.checkout(&target, now_ms)?;
        self.render();
        Ok(())
    }

    fn checkout(&mut self, id: &RoadmapId, now_ms: i64) -> Result<(), SessionError> {
        let doc = DocumentStore::new(&self.kv).load(id, now_ms)?;
        self.current_id = id.clone();
        self.graph.reset(doc.nodes, doc.connections);
        self.notepad = doc.notepad;
        self.notepad_font_size = doc.notepad_font_size;
        self.connect.cancel();
        self.autosave.cancel();
        Ok(())
    }
}
