use crate::browser::session::{BrowserSession, Locator, Rect};
use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus, WebDriver as WebDriverError};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use webdriver::capabilities::Capabilities;

/// WebDriver key codes.
pub mod keys {
    pub const TAB: &str = "\u{e004}";
    pub const ENTER: &str = "\u{e007}";
}

const SET_VALUE_SCRIPT: &str = r#"
const el = arguments[0];
const proto = el.tagName === 'TEXTAREA'
    ? HTMLTextAreaElement.prototype
    : HTMLInputElement.prototype;
const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
setter.call(el, arguments[1]);
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
"#;

const SELECT_OPTION_SCRIPT: &str = r#"
const [select, option] = arguments;
option.selected = true;
select.dispatchEvent(new Event('input', { bubbles: true }));
select.dispatchEvent(new Event('change', { bubbles: true }));
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// [`BrowserSession`] backed by a `fantoccini` WebDriver client.
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Connect to a running WebDriver service (Chromedriver by default at
    /// `http://localhost:9515`).
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = Capabilities::new();
        #[cfg(feature = "chromium")]
        {
            let mut chrome_opts = HashMap::new();
            let mut args = vec![
                json!("--window-size=1920,1080"),
                json!("--disable-dev-shm-usage"),
            ];
            if headless {
                args.push(json!("--headless=new"));
                args.push(json!("--disable-gpu"));
            }
            chrome_opts.insert("args".to_string(), json!(args));
            caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| {
                EasyApplyError::Driver(anyhow::Error::new(e).context(format!(
                    "failed to connect to WebDriver at {webdriver_url}"
                )))
            })?;

        debug!(target: "browser", %webdriver_url, headless, "webdriver session opened");
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| cmd_error("close", e))
    }

    async fn execute_on(&self, script: &str, element: &Element, extra: Vec<serde_json::Value>) -> Result<()> {
        let mut args = vec![serde_json::to_value(element)?];
        args.extend(extra);
        self.client
            .execute(script, args)
            .await
            .map(|_| ())
            .map_err(|e| cmd_error("execute", e))
    }
}

fn to_fantoccini(locator: Locator<'_>) -> fantoccini::Locator<'_> {
    match locator {
        Locator::Id(id) => fantoccini::Locator::Id(id),
        Locator::Css(css) => fantoccini::Locator::Css(css),
        Locator::XPath(xpath) => fantoccini::Locator::XPath(xpath),
    }
}

fn describe(locator: Locator<'_>) -> String {
    match locator {
        Locator::Id(id) => format!("#{id}"),
        Locator::Css(css) => css.to_string(),
        Locator::XPath(xpath) => xpath.to_string(),
    }
}

/// Missing and stale elements are `NotFound`; callers treat both as absent.
fn cmd_error(what: &str, e: CmdError) -> EasyApplyError {
    match e {
        e if e.is_no_such_element() => EasyApplyError::NotFound(what.to_string()),
        CmdError::Standard(WebDriverError {
            error: ErrorStatus::StaleElementReference,
            ..
        }) => EasyApplyError::NotFound(format!("{what}: stale element")),
        CmdError::WaitTimeout => EasyApplyError::Timeout(what.to_string()),
        other => EasyApplyError::Driver(anyhow::Error::new(other).context(what.to_string())),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        debug!(target: "browser", %url, "navigating");
        self.client.goto(url).await.map_err(|e| cmd_error(url, e))
    }

    async fn current_url(&self) -> Result<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| cmd_error("current_url", e))
    }

    async fn find(&self, locator: Locator<'_>) -> Result<Element> {
        self.client
            .find(to_fantoccini(locator))
            .await
            .map_err(|e| cmd_error(&describe(locator), e))
    }

    async fn find_all(&self, locator: Locator<'_>) -> Result<Vec<Element>> {
        self.client
            .find_all(to_fantoccini(locator))
            .await
            .map_err(|e| cmd_error(&describe(locator), e))
    }

    async fn find_from(&self, parent: &Element, locator: Locator<'_>) -> Result<Element> {
        parent
            .find(to_fantoccini(locator))
            .await
            .map_err(|e| cmd_error(&describe(locator), e))
    }

    async fn find_all_from(&self, parent: &Element, locator: Locator<'_>) -> Result<Vec<Element>> {
        parent
            .find_all(to_fantoccini(locator))
            .await
            .map_err(|e| cmd_error(&describe(locator), e))
    }

    async fn wait_for(&self, locator: Locator<'_>, timeout: Duration) -> Result<Element> {
        self.client
            .wait()
            .at_most(timeout)
            .every(POLL_INTERVAL)
            .for_element(to_fantoccini(locator))
            .await
            .map_err(|e| cmd_error(&describe(locator), e))
    }

    async fn wait_for_clickable(&self, locator: Locator<'_>, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        let element = self.wait_for(locator, timeout).await?;
        loop {
            if self.is_interactable(&element).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(EasyApplyError::Timeout(describe(locator)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn tag_name(&self, element: &Element) -> Result<String> {
        element
            .tag_name()
            .await
            .map(|t| t.to_ascii_lowercase())
            .map_err(|e| cmd_error("tag_name", e))
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>> {
        element.attr(name).await.map_err(|e| cmd_error(name, e))
    }

    async fn value(&self, element: &Element) -> Result<String> {
        element
            .prop("value")
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| cmd_error("value", e))
    }

    async fn text(&self, element: &Element) -> Result<String> {
        element.text().await.map_err(|e| cmd_error("text", e))
    }

    async fn bounds(&self, element: &Element) -> Result<Rect> {
        let (x, y, width, height) = element
            .rectangle()
            .await
            .map_err(|e| cmd_error("rectangle", e))?;
        Ok(Rect {
            x,
            y,
            width,
            height,
        })
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool> {
        element
            .is_displayed()
            .await
            .map_err(|e| cmd_error("is_displayed", e))
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool> {
        element
            .is_enabled()
            .await
            .map_err(|e| cmd_error("is_enabled", e))
    }

    async fn is_selected(&self, element: &Element) -> Result<bool> {
        element
            .is_selected()
            .await
            .map_err(|e| cmd_error("is_selected", e))
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await.map_err(|e| cmd_error("click", e))
    }

    async fn js_click(&self, element: &Element) -> Result<()> {
        self.execute_on("arguments[0].click();", element, vec![])
            .await
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        self.execute_on(
            "arguments[0].scrollIntoView({block: 'center'});",
            element,
            vec![],
        )
        .await
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<()> {
        element
            .send_keys(text)
            .await
            .map_err(|e| cmd_error("send_keys", e))
    }

    async fn send_tab(&self, element: &Element) -> Result<()> {
        self.send_keys(element, keys::TAB).await
    }

    async fn clear(&self, element: &Element) -> Result<()> {
        element.clear().await.map_err(|e| cmd_error("clear", e))
    }

    async fn set_value(&self, element: &Element, value: &str) -> Result<()> {
        self.execute_on(SET_VALUE_SCRIPT, element, vec![json!(value)])
            .await
    }

    async fn select_option(&self, select: &Element, option: &Element) -> Result<()> {
        self.execute_on(
            SELECT_OPTION_SCRIPT,
            select,
            vec![serde_json::to_value(option)?],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_stale_elements_map_to_not_found() {
        let missing = CmdError::Standard(WebDriverError::new(
            ErrorStatus::NoSuchElement,
            "no such element",
        ));
        assert!(cmd_error("#submit", missing).is_not_found());

        let stale = CmdError::Standard(WebDriverError::new(
            ErrorStatus::StaleElementReference,
            "stale element reference",
        ));
        assert!(cmd_error("click", stale).is_not_found());

        assert!(matches!(
            cmd_error("#results", CmdError::WaitTimeout),
            EasyApplyError::Timeout(_)
        ));
    }

    #[test]
    fn other_driver_failures_stay_errors() {
        let crashed = CmdError::Standard(WebDriverError::new(
            ErrorStatus::UnknownError,
            "chrome not reachable",
        ));
        let err = cmd_error("click", crashed);
        assert!(matches!(err, EasyApplyError::Driver(_)));
        assert!(!err.is_not_found());
    }
}
