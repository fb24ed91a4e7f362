pub mod browser;
pub mod middleware;
pub mod service;

pub use browser::ChromeLauncher;
pub use middleware::FetchProfile;
pub use service::HttpService;
