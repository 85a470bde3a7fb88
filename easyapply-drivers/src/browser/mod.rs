pub mod pacing;
pub mod session;
pub mod webdriver;

#[cfg(feature = "fake")]
pub mod fake;
