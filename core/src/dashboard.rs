//! Shared dashboard state and the composed operations that mutate it.
//!
//! Snapshot, visibility, rows, viewport and graph feed all live in one
//! [`Dashboard`] behind one lock. Every public operation leaves the five in
//! agreement: rows are always the projection of the current snapshot and
//! visibility, the selection is always in range, and the graph history always
//! belongs to the selected row.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use chrono::DateTime;
use chrono::Local;

use crate::graph::GraphFeed;
use crate::graph::GraphSeries;
use crate::projector;
use crate::projector::Row;
use crate::quantity::ResourceKind;
use crate::snapshot::Snapshot;
use crate::viewport::Viewport;
use crate::visibility::VisibilityState;

pub const LOADING_MESSAGE: &str = "waiting for metrics…";

/// Counters and notices shown in the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    pub last_refresh: Option<DateTime<Local>>,
    pub refreshes: u64,
    /// Set when a fetch failed but the last good snapshot was kept.
    pub warning: Option<String>,
}

/// Render-ready copy of the dashboard, detached from the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub headers: &'static [&'static str],
    /// Only the rows inside the scroll window.
    pub visible_rows: Vec<Row>,
    pub top_row: usize,
    pub selected_row: usize,
    pub total_rows: usize,
    pub cpu: GraphSeries,
    pub memory: GraphSeries,
    pub nodes: usize,
    pub pods: usize,
    pub containers: usize,
    pub status: RefreshStatus,
}

impl DashboardView {
    /// Index of the selected row within `visible_rows`.
    pub fn selected_in_window(&self) -> Option<usize> {
        self.selected_row
            .checked_sub(self.top_row)
            .filter(|i| *i < self.visible_rows.len())
    }
}

#[derive(Debug)]
pub struct Dashboard {
    snapshot: Snapshot,
    visibility: VisibilityState,
    rows: Vec<Row>,
    viewport: Viewport,
    viewport_height: usize,
    graph: GraphFeed,
    status: RefreshStatus,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(crate::graph::DEFAULT_HISTORY)
    }
}

impl Dashboard {
    pub fn new(history: usize) -> Self {
        Self {
            snapshot: Snapshot::default(),
            visibility: VisibilityState::new(),
            rows: vec![Row::message(LOADING_MESSAGE)],
            viewport: Viewport::new(),
            viewport_height: 0,
            graph: GraphFeed::new(history),
            status: RefreshStatus::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn graph(&self) -> &GraphFeed {
        &self.graph
    }

    pub fn status(&self) -> &RefreshStatus {
        &self.status
    }

    pub fn selected(&self) -> Option<&Row> {
        self.rows.get(self.viewport.selected_row())
    }

    /// Key of the selected entity; `None` on an informational row.
    pub fn selected_key(&self) -> Option<&str> {
        self.selected()
            .filter(|row| row.kind != projector::RowKind::Message)
            .map(|row| row.key.as_str())
    }

    /// Replace the snapshot, re-project, clamp the selection and feed the
    /// graph, as one step.
    pub fn apply_refresh(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.reproject();
        let key = self.selected_key().map(str::to_string);
        self.graph.observe(key.as_deref(), &self.snapshot);
        self.status.last_refresh = Some(Local::now());
        self.status.refreshes += 1;
        self.status.warning = None;
        tracing::debug!(
            nodes = self.snapshot.node_count(),
            pods = self.snapshot.pod_count(),
            rows = self.rows.len(),
            selected = self.viewport.selected_row(),
            "applied refresh"
        );
    }

    /// Keep the current snapshot after a failed fetch and surface the error.
    pub fn record_fetch_failure(&mut self, message: impl Into<String>) {
        self.status.warning = Some(message.into());
    }

    /// Expand or collapse the selected node or pod. Containers and
    /// informational rows are left alone. Returns whether anything changed.
    pub fn toggle_selected(&mut self) -> bool {
        let Some(row) = self.selected().filter(|row| row.is_expandable()) else {
            return false;
        };
        let key = row.key.clone();
        self.with_selection_guard(|dashboard| {
            dashboard.visibility.toggle(&key);
            dashboard.reproject();
            true
        })
    }

    /// Collapse every node and pod.
    pub fn collapse_all(&mut self) -> bool {
        if self.visibility.is_empty() {
            return false;
        }
        self.with_selection_guard(|dashboard| {
            dashboard.visibility.reset();
            dashboard.reproject();
            true
        })
    }

    pub fn scroll_up(&mut self) -> bool {
        let len = self.rows.len();
        self.with_selection_guard(|dashboard| dashboard.viewport.scroll_up(len))
    }

    pub fn scroll_down(&mut self) -> bool {
        let len = self.rows.len();
        self.with_selection_guard(|dashboard| dashboard.viewport.scroll_down(len))
    }

    pub fn page_up(&mut self) -> bool {
        let (len, height) = (self.rows.len(), self.viewport_height);
        self.with_selection_guard(|dashboard| dashboard.viewport.page_up(len, height))
    }

    pub fn page_down(&mut self) -> bool {
        let (len, height) = (self.rows.len(), self.viewport_height);
        self.with_selection_guard(|dashboard| dashboard.viewport.page_down(len, height))
    }

    pub fn home(&mut self) -> bool {
        let len = self.rows.len();
        self.with_selection_guard(|dashboard| dashboard.viewport.home(len))
    }

    pub fn end(&mut self) -> bool {
        let len = self.rows.len();
        self.with_selection_guard(|dashboard| dashboard.viewport.end(len))
    }

    /// Number of table rows the renderer can show. Zero means unknown.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        self.viewport.ensure_visible(self.rows.len(), self.effective_height());
    }

    /// Re-establish the scroll window for `height` and copy out everything
    /// a draw needs.
    pub fn frame(&mut self, height: Option<usize>) -> DashboardView {
        if let Some(height) = height {
            self.viewport_height = height;
        }
        let len = self.rows.len();
        let window = self.effective_height();
        self.viewport.ensure_visible(len, window);

        let top = self.viewport.top_row();
        let end = top.saturating_add(window).min(len);
        DashboardView {
            headers: projector::headers(&self.rows),
            visible_rows: self.rows[top.min(end)..end].to_vec(),
            top_row: top,
            selected_row: self.viewport.selected_row(),
            total_rows: len,
            cpu: self.graph.series(ResourceKind::Cpu),
            memory: self.graph.series(ResourceKind::Memory),
            nodes: self.snapshot.node_count(),
            pods: self.snapshot.pod_count(),
            containers: self.snapshot.container_count(),
            status: self.status.clone(),
        }
    }

    fn effective_height(&self) -> usize {
        if self.viewport_height == 0 {
            self.rows.len().max(1)
        } else {
            self.viewport_height
        }
    }

    fn reproject(&mut self) {
        self.rows = projector::project(&self.snapshot, &self.visibility);
        self.viewport.clamp(self.rows.len());
        self.viewport
            .ensure_visible(self.rows.len(), self.effective_height());
    }

    /// Run `op`; if the selected entity differs afterwards, drop the graph
    /// history so two entities' samples are never mixed.
    fn with_selection_guard(&mut self, op: impl FnOnce(&mut Self) -> bool) -> bool {
        let before = self.selected_key().map(str::to_string);
        let changed = op(self);
        if self.selected_key() != before.as_deref() {
            self.graph.clear();
        }
        if changed {
            self.viewport
                .ensure_visible(self.rows.len(), self.effective_height());
        }
        changed
    }
}

/// The single coarse lock around [`Dashboard`], shared by the fetch task and
/// the input handler. Never hold a guard across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SharedDashboard {
    inner: Arc<RwLock<Dashboard>>,
}

impl SharedDashboard {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            inner: Arc::new(RwLock::new(dashboard)),
        }
    }

    /// A panic while holding the lock cannot leave the dashboard half
    /// updated in a way later operations care about (every operation
    /// re-derives rows and clamps), so poisoning is ignored.
    pub fn read(&self) -> RwLockReadGuard<'_, Dashboard> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Dashboard> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
