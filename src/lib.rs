//! Form, list and error-message glue for a single page, running against a
//! deterministic in-process DOM.
//!
//! A [`Page`] is built from an HTML fixture, [`glue::install`] wires the
//! submit and click handlers, and user actions such as [`Page::click`] or
//! [`Page::submit`] drive them synchronously.
//!
//! ```
//! use page_glue::{glue, Page, Result};
//!
//! fn main() -> Result<()> {
//!     let mut page = Page::from_html(
//!         r#"
//!         <form id='user-form'><input name='item'><button>Add</button></form>
//!         <ul id='item-list'></ul>
//!         <p id='error-message' class='hidden'></p>
//!         "#,
//!     )?;
//!     glue::install(&mut page)?;
//!     page.finish_loading()?;
//!
//!     page.type_text("input[name=item]", "milk")?;
//!     page.submit("#user-form")?;
//!     page.assert_count("#item-list > li", 1)?;
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};

mod dom;
mod form;
pub mod glue;
mod html;
mod page;
mod runtime_state;
mod selector;

pub use dom::{Dom, NodeId};
pub use glue::{ErrorDisplay, GlueConfig, GlueHandles, Prop};
pub use page::Page;
pub use runtime_state::{Event, EventPhase};

use html::parse_html;
use runtime_state::{Listener, ListenerStore, TraceState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("dom error: {0}")]
    Dom(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("event dispatch error: {0}")]
    Dispatch(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("type mismatch for {selector}: expected {expected}, actual {actual}")]
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error(
        "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
    )]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in value.chars().enumerate() {
        if count >= max_chars {
            out.push_str("...");
            return out;
        }
        out.push(ch);
    }
    out
}
