//! Read model views for the admin panel and account pages.

pub mod customer_directory;
pub mod dashboard;
pub mod order_board;

pub use customer_directory::CustomerDirectory;
pub use dashboard::DashboardStats;
pub use order_board::LiveOrderBoard;
