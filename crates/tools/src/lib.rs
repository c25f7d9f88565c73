//! Built-in tools for Symposium agents.
//!
//! Three tools are available to personas with `can_use_tools`:
//! arithmetic, web search snippets, and the current date/time. The
//! [`ToolRouter`] decides when one is needed and runs it.

pub mod calculator;
pub mod clock;
pub mod router;
pub mod web_search;

pub use clock::Clock;
pub use router::{Classifier, ToolRouter};
pub use web_search::{DisabledSearch, DuckDuckGo, SearchProvider};
