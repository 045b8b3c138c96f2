//! The refresh loop: a periodic fetch task, an input consumer and a single
//! coalesced render step, all mutating one [`SharedDashboard`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::dashboard::Dashboard;
use crate::dashboard::DashboardView;
use crate::dashboard::SharedDashboard;
use crate::error::KtopError;
use crate::error::Result;
use crate::filter::Filters;
use crate::graph::DEFAULT_HISTORY;
use crate::inventory::MetricsSource;
use crate::snapshot::Snapshot;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// User intent, already decoupled from any terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Toggle,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    CollapseAll,
    Resize(u16, u16),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    /// The shutdown future (normally Ctrl-C) resolved.
    Interrupted,
    InputClosed,
}

/// What a failed fetch does to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchErrorPolicy {
    /// End the session with the error.
    #[default]
    Exit,
    /// Keep showing the last good snapshot and surface a warning.
    Retain,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub interval: Duration,
    pub policy: FetchErrorPolicy,
    pub filters: Filters,
    /// Graph samples kept per resource.
    pub history: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            policy: FetchErrorPolicy::default(),
            filters: Filters::default(),
            history: DEFAULT_HISTORY,
        }
    }
}

/// Draws a [`DashboardView`] somewhere.
pub trait Renderer {
    fn render(&mut self, view: &DashboardView) -> Result<()>;

    /// Rows available to the table body, if known. Re-queried before every
    /// draw so resizes take effect immediately.
    fn viewport_height(&self) -> Option<u16>;
}

pub struct Orchestrator<S> {
    source: Arc<S>,
    config: OrchestratorConfig,
    dashboard: SharedDashboard,
}

impl<S> Orchestrator<S>
where
    S: MetricsSource + 'static,
{
    pub fn new(source: Arc<S>, config: OrchestratorConfig) -> Self {
        let dashboard = SharedDashboard::new(Dashboard::new(config.history));
        Self {
            source,
            config,
            dashboard,
        }
    }

    pub fn dashboard(&self) -> SharedDashboard {
        self.dashboard.clone()
    }

    /// Run until the user quits, `shutdown` resolves, the input stream ends,
    /// a fetch fails under [`FetchErrorPolicy::Exit`], or the fetch task dies.
    ///
    /// The fetch task is cancelled and joined before this returns; a result
    /// that arrives after cancellation is never applied.
    pub async fn run<E, R, F>(
        self,
        mut events: E,
        renderer: &mut R,
        shutdown: F,
    ) -> Result<ExitReason>
    where
        E: Stream<Item = InputEvent> + Unpin,
        R: Renderer,
        F: Future<Output = ()>,
    {
        let Self {
            source,
            config,
            dashboard,
        } = self;
        info!(
            interval_ms = config.interval.as_millis() as u64,
            policy = ?config.policy,
            filters = ?config.filters.patterns(),
            "starting refresh loop"
        );

        let cancel = CancellationToken::new();
        let (redraw_tx, mut redraw_rx) = mpsc::channel::<()>(1);
        let (error_tx, mut error_rx) = mpsc::channel::<KtopError>(1);

        let mut fetch_task = tokio::spawn(fetch_loop(
            source,
            dashboard.clone(),
            config,
            cancel.clone(),
            redraw_tx.clone(),
            error_tx,
        ));

        let mut fetch_finished = false;
        let mut outcome = draw(&dashboard, renderer).map(|()| None);
        tokio::pin!(shutdown);
        while let Ok(None) = outcome {
            outcome = tokio::select! {
                () = &mut shutdown => Ok(Some(ExitReason::Interrupted)),
                Some(err) = error_rx.recv() => Err(err),
                // The task only returns on its own after queueing an error,
                // which the arm above picks up next.
                joined = &mut fetch_task, if !fetch_finished => {
                    fetch_finished = true;
                    joined.map(|()| None).map_err(KtopError::TaskJoin)
                }
                event = events.next() => match event {
                    None => Ok(Some(ExitReason::InputClosed)),
                    Some(InputEvent::Quit) => Ok(Some(ExitReason::Quit)),
                    Some(event) => {
                        if apply_input(&mut dashboard.write(), event) {
                            request_redraw(&redraw_tx);
                        }
                        Ok(None)
                    }
                },
                Some(()) = redraw_rx.recv() => draw(&dashboard, renderer).map(|()| None),
            };
        }

        cancel.cancel();
        let joined = if fetch_finished {
            Ok(())
        } else {
            fetch_task.await
        };
        match (outcome, joined) {
            (Err(err), _) => {
                error!("refresh loop failed: {err}");
                Err(err)
            }
            (Ok(_), Err(join_err)) => Err(KtopError::TaskJoin(join_err)),
            (Ok(reason), Ok(())) => {
                let reason = reason.unwrap_or(ExitReason::Quit);
                info!(?reason, "refresh loop stopped");
                Ok(reason)
            }
        }
    }
}

async fn fetch_loop<S>(
    source: Arc<S>,
    dashboard: SharedDashboard,
    config: OrchestratorConfig,
    cancel: CancellationToken,
    redraw_tx: mpsc::Sender<()>,
    error_tx: mpsc::Sender<KtopError>,
) where
    S: MetricsSource + 'static,
{
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = source.fetch() => fetched,
        };

        match fetched {
            Ok(inventory) => {
                let snapshot = Snapshot::build(&inventory, &config.filters);
                {
                    let mut dashboard = dashboard.write();
                    if cancel.is_cancelled() {
                        debug!("discarding refresh that completed after shutdown");
                        break;
                    }
                    dashboard.apply_refresh(snapshot);
                }
                request_redraw(&redraw_tx);
            }
            Err(err) if config.policy == FetchErrorPolicy::Retain => {
                warn!("keeping previous snapshot: {err}");
                {
                    let mut dashboard = dashboard.write();
                    if cancel.is_cancelled() {
                        break;
                    }
                    dashboard.record_fetch_failure(err.to_string());
                }
                request_redraw(&redraw_tx);
            }
            Err(err) => {
                if !cancel.is_cancelled() {
                    let _ = error_tx.send(err).await;
                }
                break;
            }
        }
    }
}

/// At most one redraw is ever pending; extra requests fold into it.
fn request_redraw(tx: &mpsc::Sender<()>) {
    let _ = tx.try_send(());
}

fn draw<R: Renderer>(dashboard: &SharedDashboard, renderer: &mut R) -> Result<()> {
    let height = renderer.viewport_height().map(usize::from);
    let view = dashboard.write().frame(height);
    renderer.render(&view)
}

/// Returns whether the event warrants a redraw.
fn apply_input(dashboard: &mut Dashboard, event: InputEvent) -> bool {
    match event {
        InputEvent::Toggle => dashboard.toggle_selected(),
        InputEvent::Up => dashboard.scroll_up(),
        InputEvent::Down => dashboard.scroll_down(),
        InputEvent::PageUp => dashboard.page_up(),
        InputEvent::PageDown => dashboard.page_down(),
        InputEvent::Home => dashboard.home(),
        InputEvent::End => dashboard.end(),
        InputEvent::CollapseAll => dashboard.collapse_all(),
        InputEvent::Resize(_, _) => true,
        InputEvent::Quit => false,
    }
}
