pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod file_service;
pub mod file_service_impl;
pub use file_service::{FileError, FileService, StoredFile};
pub use file_service_impl::GcsFileService;

pub mod insight_service;
pub mod insight_service_impl;
pub use insight_service::{InsightError, InsightService};
pub use insight_service_impl::GeminiInsightService;
