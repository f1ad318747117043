//! Website serving
//!
//! [`PageServer`] answers page requests for a flow: stored pages are served
//! directly, other paths are generated by the pipeline (subject to link
//! gating) and written back to the flow in the background.

mod error;
mod page_server;
mod request;
mod router;
mod writer;

pub use error::{ServeError, NO_HTML_OUTPUT};
pub use page_server::{PageServer, PageSource, ServeSettings, Served};
pub use request::PageRequest;
pub use router::{build_router, AppState};
pub use writer::{PersistOutcome, StoreWriter, MAX_COMMIT_ATTEMPTS};
