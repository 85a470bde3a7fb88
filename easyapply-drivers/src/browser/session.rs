use async_trait::async_trait;
use easyapply_common::Result;
use std::fmt::Debug;
use std::time::Duration;

/// How to locate an element.
///
/// Attribute predicates are expressed in CSS; text predicates and relative
/// paths (`..`, `preceding::`) in XPath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Id(&'a str),
    Css(&'a str),
    XPath(&'a str),
}

/// Element bounds in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Capability surface over one live browser tab.
///
/// Every call may fail with [`easyapply_common::EasyApplyError::NotFound`] or
/// [`easyapply_common::EasyApplyError::Timeout`]; callers treat both as a
/// negative answer (see [`easyapply_common::EasyApplyError::is_not_found`]).
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opaque element handle. Handles may go stale after navigation.
    type Element: Clone + Debug + Send + Sync;

    async fn goto(&self, url: &str) -> Result<()>;
    async fn current_url(&self) -> Result<String>;

    async fn find(&self, locator: Locator<'_>) -> Result<Self::Element>;
    async fn find_all(&self, locator: Locator<'_>) -> Result<Vec<Self::Element>>;
    async fn find_from(&self, parent: &Self::Element, locator: Locator<'_>)
        -> Result<Self::Element>;
    async fn find_all_from(
        &self,
        parent: &Self::Element,
        locator: Locator<'_>,
    ) -> Result<Vec<Self::Element>>;

    /// Poll for `locator` until it appears or `timeout` elapses.
    async fn wait_for(&self, locator: Locator<'_>, timeout: Duration) -> Result<Self::Element>;

    /// Like [`BrowserSession::wait_for`] but also requires the element to be
    /// displayed and enabled.
    async fn wait_for_clickable(
        &self,
        locator: Locator<'_>,
        timeout: Duration,
    ) -> Result<Self::Element>;

    async fn tag_name(&self, element: &Self::Element) -> Result<String>;
    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;
    /// Current `value` property (not the attribute).
    async fn value(&self, element: &Self::Element) -> Result<String>;
    /// Rendered text with whitespace as the browser reports it.
    async fn text(&self, element: &Self::Element) -> Result<String>;
    async fn bounds(&self, element: &Self::Element) -> Result<Rect>;
    async fn is_displayed(&self, element: &Self::Element) -> Result<bool>;
    async fn is_enabled(&self, element: &Self::Element) -> Result<bool>;
    async fn is_selected(&self, element: &Self::Element) -> Result<bool>;

    async fn click(&self, element: &Self::Element) -> Result<()>;
    /// Click through script, bypassing overlay interception.
    async fn js_click(&self, element: &Self::Element) -> Result<()>;
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;
    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<()>;
    /// Press Tab with focus on `element`.
    async fn send_tab(&self, element: &Self::Element) -> Result<()>;
    async fn clear(&self, element: &Self::Element) -> Result<()>;
    /// Assign `value` directly and fire `input` and `change` events.
    async fn set_value(&self, element: &Self::Element, value: &str) -> Result<()>;
    /// Make `option` (a handle found under `select`) the selected option and
    /// fire `input` and `change` on the select.
    async fn select_option(&self, select: &Self::Element, option: &Self::Element) -> Result<()>;

    /// Parent element, if any.
    async fn parent(&self, element: &Self::Element) -> Result<Self::Element> {
        self.find_from(element, Locator::XPath("..")).await
    }

    /// `find` that maps not-found and timeout to `None`.
    async fn try_find(&self, locator: Locator<'_>) -> Result<Option<Self::Element>> {
        match self.find(locator).await {
            Ok(el) => Ok(Some(el)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Trimmed attribute value, empty when absent.
    async fn attr_or_empty(&self, element: &Self::Element, name: &str) -> String {
        match self.attr(element, name).await {
            Ok(Some(v)) => v.trim().to_string(),
            _ => String::new(),
        }
    }

    /// Displayed and enabled; errors count as not interactable.
    async fn is_interactable(&self, element: &Self::Element) -> bool {
        matches!(self.is_displayed(element).await, Ok(true))
            && matches!(self.is_enabled(element).await, Ok(true))
    }
}
