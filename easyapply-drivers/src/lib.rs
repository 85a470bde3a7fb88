//! Driver layer for browser automation.
//!
//! This crate exposes the narrow browser capability the application wizard
//! operates through, and its backends.
//!
//! - [`browser::session::BrowserSession`]: locate, read, click, type, wait
//! - [`browser::webdriver::WebDriverSession`]: `fantoccini` WebDriver backend
//! - [`browser::pacing::Pacing`]: settle delays and keystroke timing
//! - `browser::fake::FakeBrowser` (feature `fake`): in-memory pages for tests
pub mod browser;

pub use browser::pacing::Pacing;
pub use browser::session::{BrowserSession, Locator, Rect};
pub use browser::webdriver::{keys, WebDriverSession};

#[cfg(feature = "fake")]
pub use browser::fake::{FakeBrowser, FakeElement, FakeEvent};
