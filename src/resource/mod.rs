//! Resource list management: the kinds, their endpoints, pending forms and the
//! generic list manager behind every dashboard screen.

mod form;
mod grouping;
mod kinds;
mod manager;

pub use form::{PendingForm, IMAGE_AGAIN};
pub use grouping::{group_by_status, Grouped};
pub use kinds::{EndpointConfig, ResourceKind, ToggleMode};
pub use manager::{LoadState, ResourceListManager};
