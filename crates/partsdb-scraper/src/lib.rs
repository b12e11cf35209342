pub mod aggregate;
pub mod classify;
pub mod error;
pub mod extract;
pub mod identity;
pub mod navigator;
pub mod page;
pub mod phone;
pub mod pipeline;
mod retry;
pub mod url;

pub use aggregate::{merge, MergeOutcome};
pub use classify::{appliance_from_url, classify, part_type_from_name};
pub use error::ScraperError;
pub use extract::{extract, RawCandidate};
pub use identity::{FixedIdentityRotator, Identity, IdentityRotator, RandomIdentityRotator};
pub use navigator::chromium::ChromiumNavigator;
pub use navigator::fixture::{FixtureNavigator, FixturePage};
pub use navigator::{Navigator, PageHandle};
pub use page::HtmlPage;
pub use phone::resolve_phone;
pub use pipeline::{run_pipeline, RunReport, UrlOutcome, UrlSummary};
