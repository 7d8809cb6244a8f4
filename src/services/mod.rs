pub mod draft_service;
pub mod session_sweeper;

pub use draft_service::DraftService;
pub use session_sweeper::SessionSweeper;
