pub mod hierarchy;
pub mod routes;
pub mod troubleshoot;
pub mod types;

pub use hierarchy::{validate_request, ValidationReport};
pub use routes::{BackendRoutes, Endpoint};
pub use troubleshoot::troubleshooting_tips;
pub use types::{
    BackendService, Mode, Operation, OperationParams, OperationRequest, Pagination,
    ResourceHierarchy, ResourceKind,
};
