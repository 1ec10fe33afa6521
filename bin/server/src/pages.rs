//! Page components for the application.

pub mod feed;
pub mod login;
pub mod profile;

pub use feed::FeedPage;
pub use login::{LoginFailedPage, LoginPage};
pub use profile::ProfilePage;
