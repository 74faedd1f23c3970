pub mod aggregator;
pub mod appraisal;
pub mod extract;
pub mod fallback;
pub mod library;
pub mod stats;
pub mod template;

pub use aggregator::{build_aggregator, PriceAggregator};
pub use appraisal::Appraiser;
pub use extract::ListingExtractor;
pub use fallback::{FallbackPolicy, Resolution};
pub use library::{TemplateDraft, TemplateLibrary};
pub use template::synthesize;
