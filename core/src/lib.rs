//! Root of the `ktop-core` library: the resource hierarchy engine behind the
//! dashboard, independent of any cluster client or terminal library.

// All user-visible output goes through a `Renderer` or the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod dashboard;
pub mod error;
pub mod filter;
pub mod format;
pub mod graph;
pub mod inventory;
pub mod key;
pub mod orchestrator;
pub mod projector;
pub mod quantity;
pub mod snapshot;
pub mod viewport;
pub mod visibility;

pub use dashboard::Dashboard;
pub use dashboard::DashboardView;
pub use dashboard::SharedDashboard;
pub use error::KtopError;
pub use error::Result;
pub use filter::Filters;
pub use inventory::Inventory;
pub use inventory::MetricsSource;
pub use key::EntityKey;
pub use orchestrator::ExitReason;
pub use orchestrator::FetchErrorPolicy;
pub use orchestrator::InputEvent;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::Renderer;
pub use projector::Row;
pub use projector::RowKind;
pub use quantity::ResourceKind;
pub use quantity::ResourceQuantities;
pub use snapshot::Snapshot;
