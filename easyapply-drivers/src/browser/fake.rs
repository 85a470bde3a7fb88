//! In-memory [`BrowserSession`] over static HTML pages.
//!
//! Pages are HTML strings parsed with `scraper`; per-element state
//! (values, checked radios, selected options) lives in side tables so the
//! markup itself never changes. A few `data-*` attributes script behaviour:
//!
//! - `data-goto="N"` on any element: clicking it switches to page `N`.
//! - `data-href="URL"`: clicking it navigates to `URL` (routes apply).
//! - `data-y="120"` (also `data-x`, `data-w`, `data-h`): element bounds.
//!   Without `data-y` the nearest ancestor's value is used, else the
//!   element's document position times 30.
//! - `data-reject-script`: `set_value` is silently ignored.
//! - `data-reject-chunks`: `send_keys` with more than one character is ignored.
//!
//! CSS locators support whatever `scraper` parses. XPath locators support `..`
//! and `preceding::*[self::a or self::b][position() <= N]`; the latter returns
//! the N nearest matches in document order, as a real driver does.

use crate::browser::session::{BrowserSession, Locator, Rect};
use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Handle to one element on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeElement {
    page: usize,
    index: usize,
}

/// Recorded interaction, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Goto(String),
    Click(String),
    Keys { target: String, text: String },
    SetValue { target: String, value: String },
    Select { target: String, label: String },
}

#[derive(Default)]
struct State {
    pages: Vec<String>,
    routes: Vec<(String, usize)>,
    current: usize,
    url: String,
    values: HashMap<FakeElement, String>,
    checked: HashMap<FakeElement, bool>,
    selected_option: HashMap<FakeElement, usize>,
    events: Vec<FakeEvent>,
}

/// Scriptable fake browser for tests.
pub struct FakeBrowser {
    state: Mutex<State>,
}

struct Doc {
    html: Html,
}

impl Doc {
    fn parse(src: &str) -> Self {
        Self {
            html: Html::parse_document(src),
        }
    }

    fn elements(&self) -> Vec<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn get(&self, index: usize) -> Option<ElementRef<'_>> {
        self.elements().into_iter().nth(index)
    }

    fn index_of(&self, el: &ElementRef<'_>) -> Option<usize> {
        self.elements().iter().position(|e| e.id() == el.id())
    }
}

fn parse_css(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EasyApplyError::Driver(anyhow::anyhow!("invalid selector {css:?}: {e:?}")))
}

fn tag(el: &ElementRef<'_>) -> String {
    el.value().name().to_ascii_lowercase()
}

fn attr(el: &ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(str::to_string)
}

fn parent_element<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.parent().and_then(ElementRef::wrap)
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_hidden_attr(el: &ElementRef<'_>) -> bool {
    let style_hidden = attr(el, "style")
        .map(|s| s.replace(' ', "").contains("display:none"))
        .unwrap_or(false);
    let hidden_input = tag(el) == "input"
        && attr(el, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
    el.value().attr("hidden").is_some() || style_hidden || hidden_input
}

fn is_private_use_key(text: &str) -> bool {
    text.chars().all(|c| ('\u{e000}'..='\u{f8ff}').contains(&c))
}

enum XPathQuery {
    Parent,
    Preceding { tags: Vec<String>, limit: Option<usize> },
}

fn parse_xpath(xpath: &str) -> Option<XPathQuery> {
    let xpath = xpath.trim();
    if xpath == ".." {
        return Some(XPathQuery::Parent);
    }
    let rest = xpath.strip_prefix("preceding::*")?;
    let mut tags = Vec::new();
    let mut limit = None;
    for predicate in rest.split(']') {
        let predicate = predicate.trim().trim_start_matches('[').trim();
        if predicate.is_empty() {
            continue;
        }
        if predicate.starts_with("self::") {
            tags = predicate
                .split(" or ")
                .map(|p| p.trim().trim_start_matches("self::").to_ascii_lowercase())
                .collect();
        } else if let Some(n) = predicate.strip_prefix("position()") {
            let n = n.trim().trim_start_matches("<=").trim();
            limit = Some(n.parse().ok()?);
        } else {
            return None;
        }
    }
    Some(XPathQuery::Preceding { tags, limit })
}

impl State {
    fn doc(&self) -> Doc {
        Doc::parse(self.pages.get(self.current).map(String::as_str).unwrap_or(""))
    }

    fn handle(&self, index: usize) -> FakeElement {
        FakeElement {
            page: self.current,
            index,
        }
    }

    fn resolve<'d>(&self, doc: &'d Doc, el: &FakeElement) -> Result<ElementRef<'d>> {
        if el.page != self.current {
            return Err(EasyApplyError::NotFound("stale element".to_string()));
        }
        doc.get(el.index)
            .ok_or_else(|| EasyApplyError::NotFound("stale element".to_string()))
    }

    fn label_of(&self, el: &FakeElement) -> String {
        let doc = self.doc();
        let Ok(node) = self.resolve(&doc, el) else {
            return String::new();
        };
        attr(&node, "aria-label")
            .or_else(|| attr(&node, "id"))
            .unwrap_or_else(|| collapse(&node.text().collect::<String>()))
    }

    fn find_all(&self, scope: Option<&FakeElement>, locator: Locator<'_>) -> Result<Vec<FakeElement>> {
        let doc = self.doc();
        let all = doc.elements();
        let scope_node = scope.map(|s| self.resolve(&doc, s)).transpose()?;

        let css = match locator {
            Locator::Id(id) => format!("[id='{id}']"),
            Locator::Css(css) => css.to_string(),
            Locator::XPath(xpath) => {
                let scope_node = scope_node.ok_or_else(|| {
                    EasyApplyError::Driver(anyhow::anyhow!("absolute xpath unsupported: {xpath}"))
                })?;
                let query = parse_xpath(xpath).ok_or_else(|| {
                    EasyApplyError::Driver(anyhow::anyhow!("unsupported xpath: {xpath}"))
                })?;
                return Ok(self.eval_xpath(&doc, &all, scope_node, query));
            }
        };

        let selector = parse_css(&css)?;
        let found = match scope_node {
            Some(parent) => parent
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .filter(|e| selector.matches(e))
                .filter_map(|e| doc.index_of(&e))
                .map(|i| self.handle(i))
                .collect(),
            None => all
                .iter()
                .enumerate()
                .filter(|(_, e)| selector.matches(e))
                .map(|(i, _)| self.handle(i))
                .collect(),
        };
        Ok(found)
    }

    fn eval_xpath(
        &self,
        doc: &Doc,
        all: &[ElementRef<'_>],
        node: ElementRef<'_>,
        query: XPathQuery,
    ) -> Vec<FakeElement> {
        match query {
            XPathQuery::Parent => parent_element(&node)
                .and_then(|p| doc.index_of(&p))
                .map(|i| vec![self.handle(i)])
                .unwrap_or_default(),
            XPathQuery::Preceding { tags, limit } => {
                let Some(position) = doc.index_of(&node) else {
                    return Vec::new();
                };
                let ancestors: Vec<_> = node.ancestors().map(|a| a.id()).collect();
                // The position predicate counts back from the context node,
                // but the node-set comes back in document order.
                let mut nearest: Vec<FakeElement> = all[..position]
                    .iter()
                    .enumerate()
                    .rev()
                    .filter(|(_, e)| !ancestors.contains(&e.id()))
                    .filter(|(_, e)| tags.is_empty() || tags.contains(&tag(e)))
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|(i, _)| self.handle(i))
                    .collect();
                nearest.reverse();
                nearest
            }
        }
    }

    fn first(&self, scope: Option<&FakeElement>, locator: Locator<'_>) -> Result<FakeElement> {
        self.find_all(scope, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| EasyApplyError::NotFound(format!("{locator:?}")))
    }

    fn displayed(&self, el: &FakeElement) -> Result<bool> {
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        if is_hidden_attr(&node) {
            return Ok(false);
        }
        Ok(!node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_hidden_attr(&a)))
    }

    fn enabled(&self, el: &FakeElement) -> Result<bool> {
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        Ok(node.value().attr("disabled").is_none())
    }

    fn options_of(&self, doc: &Doc, select: &ElementRef<'_>) -> Vec<usize> {
        select
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|e| tag(e) == "option")
            .filter_map(|e| doc.index_of(&e))
            .collect()
    }

    fn selected_option_index(&self, doc: &Doc, select_handle: &FakeElement) -> Result<Option<usize>> {
        let select = self.resolve(doc, select_handle)?;
        if let Some(index) = self.selected_option.get(select_handle) {
            return Ok(Some(*index));
        }
        let options = self.options_of(doc, &select);
        let marked = options
            .iter()
            .copied()
            .find(|i| doc.get(*i).is_some_and(|o| o.value().attr("selected").is_some()));
        Ok(marked.or_else(|| options.first().copied()))
    }

    fn selected(&self, el: &FakeElement) -> Result<bool> {
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        match tag(&node).as_str() {
            "option" => {
                let Some(select) = parent_element(&node).and_then(|p| doc.index_of(&p)) else {
                    return Ok(false);
                };
                let select = self.handle(select);
                Ok(self.selected_option_index(&doc, &select)? == Some(el.index))
            }
            _ => Ok(self
                .checked
                .get(el)
                .copied()
                .unwrap_or_else(|| node.value().attr("checked").is_some())),
        }
    }

    fn value(&self, el: &FakeElement) -> Result<String> {
        if let Some(v) = self.values.get(el) {
            return Ok(v.clone());
        }
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        Ok(match tag(&node).as_str() {
            "textarea" => node.text().collect::<String>(),
            "select" => match self.selected_option_index(&doc, el)?.and_then(|i| doc.get(i)) {
                Some(option) => attr(&option, "value")
                    .unwrap_or_else(|| collapse(&option.text().collect::<String>())),
                None => String::new(),
            },
            _ => attr(&node, "value").unwrap_or_default(),
        })
    }

    fn bounds(&self, el: &FakeElement) -> Result<Rect> {
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        let num = |e: &ElementRef<'_>, name: &str| attr(e, name).and_then(|v| v.parse::<f64>().ok());

        let y = num(&node, "data-y")
            .or_else(|| {
                node.ancestors()
                    .filter_map(ElementRef::wrap)
                    .find_map(|a| num(&a, "data-y"))
            })
            .unwrap_or(el.index as f64 * 30.0);

        Ok(Rect {
            x: num(&node, "data-x").unwrap_or(0.0),
            y,
            width: num(&node, "data-w").unwrap_or(100.0),
            height: num(&node, "data-h").unwrap_or(20.0),
        })
    }

    fn click(&mut self, el: &FakeElement) -> Result<()> {
        let enabled = self.enabled(el)?;
        let label = self.label_of(el);
        self.events.push(FakeEvent::Click(label));
        if !enabled {
            return Ok(());
        }

        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        let kind = attr(&node, "type").unwrap_or_default().to_ascii_lowercase();
        let goto = attr(&node, "data-goto").and_then(|v| v.parse::<usize>().ok());
        let href = attr(&node, "data-href");

        match (tag(&node).as_str(), kind.as_str()) {
            ("input", "radio") => {
                let name = attr(&node, "name");
                let peers = self.find_all(None, Locator::Css("input[type='radio']"))?;
                for peer in peers {
                    let same_group = self
                        .resolve(&doc, &peer)
                        .map(|p| attr(&p, "name") == name)
                        .unwrap_or(false);
                    if same_group {
                        self.checked.insert(peer, peer == *el);
                    }
                }
            }
            ("input", "checkbox") => {
                let now = self.selected(el)?;
                self.checked.insert(*el, !now);
            }
            ("option", _) => {
                if let Some(select) = parent_element(&node).and_then(|p| doc.index_of(&p)) {
                    let select = self.handle(select);
                    self.selected_option.insert(select, el.index);
                }
            }
            _ => {}
        }

        if let Some(page) = goto {
            if page < self.pages.len() {
                self.current = page;
            }
        }
        if let Some(url) = href {
            self.goto(&url);
        }
        Ok(())
    }

    fn send_keys(&mut self, el: &FakeElement, text: &str) -> Result<()> {
        let target = self.label_of(el);
        self.events.push(FakeEvent::Keys {
            target,
            text: text.to_string(),
        });
        if is_private_use_key(text) {
            return Ok(());
        }

        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        if node.value().attr("data-reject-chunks").is_some() && text.chars().count() > 1 {
            return Ok(());
        }
        let is_file = attr(&node, "type").is_some_and(|t| t.eq_ignore_ascii_case("file"));
        let mut value = if is_file { String::new() } else { self.value(el)? };
        value.push_str(text);
        self.values.insert(*el, value);
        Ok(())
    }

    fn set_value(&mut self, el: &FakeElement, value: &str) -> Result<()> {
        let target = self.label_of(el);
        self.events.push(FakeEvent::SetValue {
            target,
            value: value.to_string(),
        });
        let doc = self.doc();
        let node = self.resolve(&doc, el)?;
        if node.value().attr("data-reject-script").is_none() {
            self.values.insert(*el, value.to_string());
        }
        Ok(())
    }

    fn select_option(&mut self, select: &FakeElement, option: &FakeElement) -> Result<()> {
        let doc = self.doc();
        let node = self.resolve(&doc, select)?;
        let option_node = self.resolve(&doc, option)?;
        if !self.options_of(&doc, &node).contains(&option.index) {
            return Err(EasyApplyError::NotFound("option outside select".to_string()));
        }

        let target = self.label_of(select);
        let label = collapse(&option_node.text().collect::<String>());
        self.events.push(FakeEvent::Select { target, label });
        self.selected_option.insert(*select, option.index);
        Ok(())
    }

    fn goto(&mut self, url: &str) {
        self.events.push(FakeEvent::Goto(url.to_string()));
        self.url = url.to_string();
        if let Some((_, page)) = self.routes.iter().find(|(fragment, _)| url.contains(fragment.as_str())) {
            self.current = *page;
        }
    }
}

impl FakeBrowser {
    /// Browser showing `pages[0]`.
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Mutex::new(State {
                pages: pages.into_iter().map(Into::into).collect(),
                url: "about:blank".to_string(),
                ..State::default()
            }),
        }
    }

    /// Single-page browser.
    pub fn with_page(html: impl Into<String>) -> Self {
        Self::new([html.into()])
    }

    /// Navigating to a URL containing `fragment` shows `page`.
    pub fn route(self, fragment: impl Into<String>, page: usize) -> Self {
        self.lock().routes.push((fragment.into(), page));
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_page(&self) -> usize {
        self.lock().current
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.lock().events.clone()
    }

    /// Labels (aria-label, else id, else text) of clicked elements.
    pub fn clicks(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                FakeEvent::Click(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    /// Run `inspect` against `page` without navigating. Values written on
    /// earlier wizard pages stay readable after the browser moves on.
    fn on_page<T>(&self, page: usize, inspect: impl FnOnce(&State) -> T) -> T {
        let mut state = self.lock();
        let current = state.current;
        state.current = page;
        let result = inspect(&state);
        state.current = current;
        result
    }

    /// Current value of the first element matching `css`.
    pub fn value_of(&self, css: &str) -> Option<String> {
        self.value_on(self.current_page(), css)
    }

    /// Value of the first element matching `css` on `page`.
    pub fn value_on(&self, page: usize, css: &str) -> Option<String> {
        self.on_page(page, |state| {
            let el = state.first(None, Locator::Css(css)).ok()?;
            state.value(&el).ok()
        })
    }

    /// Checked state of the first element matching `css`.
    pub fn is_checked(&self, css: &str) -> bool {
        self.is_checked_on(self.current_page(), css)
    }

    pub fn is_checked_on(&self, page: usize, css: &str) -> bool {
        self.on_page(page, |state| {
            state
                .first(None, Locator::Css(css))
                .and_then(|el| state.selected(&el))
                .unwrap_or(false)
        })
    }

    /// Text of the selected option of the first `select` matching `css`.
    pub fn selected_label(&self, css: &str) -> Option<String> {
        self.selected_label_on(self.current_page(), css)
    }

    pub fn selected_label_on(&self, page: usize, css: &str) -> Option<String> {
        self.on_page(page, |state| {
            let select = state.first(None, Locator::Css(css)).ok()?;
            let doc = state.doc();
            let index = state.selected_option_index(&doc, &select).ok()??;
            doc.get(index)
                .map(|o| collapse(&o.text().collect::<String>()))
        })
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.lock().goto(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn find(&self, locator: Locator<'_>) -> Result<FakeElement> {
        self.lock().first(None, locator)
    }

    async fn find_all(&self, locator: Locator<'_>) -> Result<Vec<FakeElement>> {
        self.lock().find_all(None, locator)
    }

    async fn find_from(&self, parent: &FakeElement, locator: Locator<'_>) -> Result<FakeElement> {
        self.lock().first(Some(parent), locator)
    }

    async fn find_all_from(
        &self,
        parent: &FakeElement,
        locator: Locator<'_>,
    ) -> Result<Vec<FakeElement>> {
        self.lock().find_all(Some(parent), locator)
    }

    async fn wait_for(&self, locator: Locator<'_>, _timeout: Duration) -> Result<FakeElement> {
        self.lock().first(None, locator).map_err(|e| match e {
            EasyApplyError::NotFound(what) => EasyApplyError::Timeout(what),
            other => other,
        })
    }

    async fn wait_for_clickable(
        &self,
        locator: Locator<'_>,
        timeout: Duration,
    ) -> Result<FakeElement> {
        let el = self.wait_for(locator, timeout).await?;
        let state = self.lock();
        if state.displayed(&el)? && state.enabled(&el)? {
            Ok(el)
        } else {
            Err(EasyApplyError::Timeout(format!("{locator:?} not clickable")))
        }
    }

    async fn tag_name(&self, element: &FakeElement) -> Result<String> {
        let state = self.lock();
        let doc = state.doc();
        state.resolve(&doc, element).map(|n| tag(&n))
    }

    async fn attr(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        let state = self.lock();
        let doc = state.doc();
        state.resolve(&doc, element).map(|n| attr(&n, name))
    }

    async fn value(&self, element: &FakeElement) -> Result<String> {
        self.lock().value(element)
    }

    async fn text(&self, element: &FakeElement) -> Result<String> {
        let state = self.lock();
        if !state.displayed(element)? {
            return Ok(String::new());
        }
        let doc = state.doc();
        state
            .resolve(&doc, element)
            .map(|n| collapse(&n.text().collect::<String>()))
    }

    async fn bounds(&self, element: &FakeElement) -> Result<Rect> {
        self.lock().bounds(element)
    }

    async fn is_displayed(&self, element: &FakeElement) -> Result<bool> {
        self.lock().displayed(element)
    }

    async fn is_enabled(&self, element: &FakeElement) -> Result<bool> {
        self.lock().enabled(element)
    }

    async fn is_selected(&self, element: &FakeElement) -> Result<bool> {
        self.lock().selected(element)
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        self.lock().click(element)
    }

    async fn js_click(&self, element: &FakeElement) -> Result<()> {
        self.lock().click(element)
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<()> {
        let state = self.lock();
        let doc = state.doc();
        state.resolve(&doc, element).map(|_| ())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> Result<()> {
        self.lock().send_keys(element, text)
    }

    async fn send_tab(&self, element: &FakeElement) -> Result<()> {
        self.lock().send_keys(element, crate::browser::webdriver::keys::TAB)
    }

    async fn clear(&self, element: &FakeElement) -> Result<()> {
        self.lock().values.insert(*element, String::new());
        Ok(())
    }

    async fn set_value(&self, element: &FakeElement, value: &str) -> Result<()> {
        self.lock().set_value(element, value)
    }

    async fn select_option(&self, select: &FakeElement, option: &FakeElement) -> Result<()> {
        self.lock().select_option(select, option)
    }
}
