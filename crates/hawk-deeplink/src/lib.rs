//! hawk-deeplink: Friendly names and launch URLs.
//!
//! A friendly name is a platform-agnostic alias for a view, so a campaign
//! can say `vc=login` instead of a per-platform class name.
//!
//! ```text
//! <scheme>://launchvc?vc=<friendly name or class>&xib_iphone=..&xib_ipad=..&<extras>
//!                │          │
//!                │          └── FriendlyNameRegistry lookup, literal fallback
//!                └── command, matched case-insensitively
//! ```

pub mod error;
pub mod registry;
pub mod resolver;

pub use error::ResolveError;
pub use registry::{FriendlyNameRegistry, RegistrationReport};
pub use resolver::DeepLinkResolver;
