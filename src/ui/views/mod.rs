//! Application views.

pub mod detail;
pub mod help;
pub mod list;

pub use detail::DetailProps;
pub use list::{window_size, BannerEntry, IssueListProps};
