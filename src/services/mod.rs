pub mod access_policy;
pub mod catalog_service;
pub mod media_url_service;
pub mod order_service;
pub mod snapshot_builder;
pub mod status_guard;

pub use catalog_service::CatalogService;
pub use media_url_service::MediaUrlService;
pub use order_service::OrderService;
