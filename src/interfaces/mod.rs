pub mod browser;
pub mod site;

pub use browser::{BrowserHandle, BrowserLauncher, PageHandle};
pub use site::CatalogSite;
