//! Graph domain: the immutable graph value, how analysis results merge into
//! it, focus distances, label visibility, selection, pinned positions and
//! the backend contract.

pub mod backend;
pub mod distance;
pub mod error;
pub mod merge;
pub mod model;
pub mod selection;
pub mod session;
pub mod store;
pub mod visibility;

pub use backend::{GraphBackend, HttpBackend, Mutation, MutationReport, mutate_and_reload};
pub use distance::{DistanceTable, FocusDistanceCache, distance};
pub use error::{BackendError, GraphError, InputError, StoreError};
pub use merge::{MergeStats, PinnedPositions, from_snapshot, merge, merge_with_stats};
pub use model::{
    AnalysisResult, Graph, GraphLink, GraphNode, GraphSnapshot, NodeId, NodeKind, NodePayload, Pin,
};
pub use selection::{SelectionState, toggle};
pub use session::{GraphSession, LabelContext, NoteLimits};
pub use store::{JsonPositionStore, MemoryPositionStore, PositionStore};
pub use visibility::{LABEL_HOP_LIMIT, label_opacity, should_show_label};
