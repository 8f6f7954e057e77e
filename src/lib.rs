pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::app::ImageFeedApp;
pub use frameworks::config::Settings;
