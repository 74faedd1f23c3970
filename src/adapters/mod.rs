// Adapters layer: concrete implementations for external systems (marketplaces, vision API, http).

pub mod ebay;
pub mod html;
pub mod http;
pub mod mercari;
pub mod vision;
pub mod zenplus;

pub use ebay::EbaySource;
pub use http::{HttpFetcher, RawListing};
pub use mercari::MercariSource;
pub use vision::OpenAiVisionClassifier;
pub use zenplus::ZenplusSource;
