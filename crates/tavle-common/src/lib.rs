pub mod models;

// Re-export commonly used items
pub use models::auth::{ErrorResponse, LoginRequest, RefreshRequest, RefreshResponse, TokenPair};
pub use models::column::{
    humanize_header, renumber, sort_and_renumber, visible_first, ColumnDescriptor, ColumnRef,
    ColumnUpdate, PersistedColumn, StoredColumn, INTERNAL_COLUMN_PREFIX,
};
pub use models::options::{OptionResponse, SetOptionRequest, WORKSPACE_KEY};
pub use models::report::{EmployeeRecord, EmployeesRequest, ReportPeriod};
pub use models::theme::{Theme, ThemePayload};
