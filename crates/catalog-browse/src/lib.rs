//! Browsing controllers for the catalog.
//!
//! This crate drives the two interchangeable browsing modes over one
//! paginated collection:
//! - `NavigationStore` - Session state {mode, page, scroll} with a single merge mutator
//! - `PageController` - Discrete page navigation
//! - `IncrementalController` - Continuous loading as the reader nears the end
//! - `RecordLoader` - Record detail for cards and the detail view
//! - `ScrollRestoration` / `FrameThrottle` / `ScrollEvents` - Scroll plumbing
//! - `render_boundary` - Last-resort fallback for rendering defects
//! - `BrowserSession` - Wires all of the above from a `BrowserConfig`

mod boundary;
mod error;
mod fetch;
mod incremental;
mod navigation;
mod paged;
mod record;
mod route;
mod scroll;
mod session;
mod view;

pub use boundary::*;
pub use error::*;
pub use incremental::*;
pub use navigation::*;
pub use paged::*;
pub use record::*;
pub use route::*;
pub use scroll::*;
pub use session::*;
pub use view::*;
