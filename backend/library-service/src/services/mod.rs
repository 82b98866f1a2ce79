/// Business logic layer for library-service
pub mod access;
pub mod library;
pub mod locator;
pub mod principal;
pub mod progress;
pub mod range;
pub mod responder;

pub use library::LibraryService;
pub use locator::{AssetLocator, LocatedFile};
pub use principal::{JwtVerifier, TokenCarriers, TokenVerifier};
pub use progress::{ProgressHub, Subscription};
pub use range::RangePlan;
pub use responder::StreamPlan;
