pub mod page;
pub mod project;

pub use page::{Page, PageType};
pub use project::{Project, ProjectStatus, ProjectSummary};
