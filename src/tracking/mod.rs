//! Review tracking core: status derivation, event reconciliation, tracker
//! completion and message rendering.

pub mod completion;
pub mod events;
pub mod locks;
pub mod publisher;
pub mod reconciler;
pub mod render;
pub mod service;
pub mod snapshot;
pub mod status;

pub use completion::complete_tracker_if_done;
pub use events::{ReviewEvent, StateChangeEvent};
pub use locks::{PrLockGuard, PrLocks};
pub use publisher::MessagePublisher;
pub use reconciler::{EventReconciler, ReconcileOutcome};
pub use render::render_tracker;
pub use service::{CreatedTracker, TrackerService};
pub use snapshot::{reduce_reviews, ReviewRecord, ReviewState, ReviewTally};
pub use status::{derive_status, ReviewSnapshot};
