pub mod assessment;
pub mod error;
pub mod hiring;
pub mod ids;
pub mod notify;
pub mod router;
pub mod store;

pub use error::{WorkflowError, WorkflowResult};
pub use router::{placement_router, PlacementState};
