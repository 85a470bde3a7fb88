//! Job board over a search results page.

use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use easyapply_drivers::{BrowserSession, Locator, Pacing};
use easyapply_wizard::{JobBoard, JobPosting};
use std::time::Duration;
use tracing::{debug, info, warn};

const RESULTS_LIST: &str = ".jobs-search-results-list, .scaffold-layout__list";
const LIST_TIMEOUT: Duration = Duration::from_secs(15);
const CARD_SELECTORS: &[&str] = &[
    ".job-card-container",
    ".jobs-search-results__list-item",
    "li.jobs-search-results__list-item",
    ".artdeco-list__item",
];
const TITLE: &str =
    ".jobs-unified-top-card__job-title, .job-details-jobs-unified-top-card__job-title";
const COMPANY: &str =
    ".jobs-unified-top-card__company-name, .job-details-jobs-unified-top-card__company-name";
const QUICK_APPLY_BUTTONS: &[&str] = &[
    ".jobs-apply-button",
    "button[aria-label='Easy Apply']",
    "button.jobs-apply-button",
    ".jobs-apply-button--top-card",
    "button[data-control-name='jobdetails_topcard_inapply']",
];
const DISMISS: &str = "button[aria-label='Dismiss']";
const CLOSE_DIALOGS: &str = "button[aria-label='Dismiss'], button[aria-label='Close']";

pub const UNKNOWN_TITLE: &str = "Unknown Position";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Walks the job cards of the current search results.
pub struct SearchResultsBoard<'a, S: BrowserSession> {
    session: &'a S,
    pacing: &'a Pacing,
    wait_timeout: Duration,
    cards: Option<Vec<S::Element>>,
    cursor: usize,
}

impl<'a, S: BrowserSession> SearchResultsBoard<'a, S> {
    pub fn new(session: &'a S, pacing: &'a Pacing, wait_timeout: Duration) -> Self {
        Self {
            session,
            pacing,
            wait_timeout,
            cards: None,
            cursor: 0,
        }
    }

    async fn query_cards(&self) -> Result<Vec<S::Element>> {
        for css in CARD_SELECTORS {
            let cards = self.session.find_all(Locator::Css(css)).await?;
            if !cards.is_empty() {
                debug!(target: "board", selector = css, count = cards.len(), "job cards found");
                return Ok(cards);
            }
        }
        Ok(Vec::new())
    }

    async fn load_cards(&mut self) -> Result<()> {
        self.session
            .wait_for(Locator::Css(RESULTS_LIST), LIST_TIMEOUT)
            .await?;
        self.pacing.long_settle().await;
        let cards = self.query_cards().await?;
        if cards.is_empty() {
            return Err(EasyApplyError::NotFound("job cards".to_string()));
        }
        info!(target: "board", count = cards.len(), "job cards loaded");
        self.cards = Some(cards);
        Ok(())
    }

    /// Scroll past the last card and re-query; true when new cards appeared.
    async fn load_more(&mut self) -> Result<bool> {
        let known = self.cards.as_ref().map_or(0, Vec::len);
        if let Some(last) = self.cards.as_ref().and_then(|c| c.last()) {
            let _ = self.session.scroll_into_view(last).await;
        }
        self.pacing.long_settle().await;

        let cards = self.query_cards().await?;
        if cards.len() > known {
            info!(target: "board", added = cards.len() - known, "more job cards loaded");
            self.cards = Some(cards);
            Ok(true)
        } else {
            info!(target: "board", "no more job cards");
            Ok(false)
        }
    }

    async fn close_modals(&self, css: &str) {
        let Ok(buttons) = self.session.find_all(Locator::Css(css)).await else {
            return;
        };
        for button in buttons {
            if self.session.is_displayed(&button).await.unwrap_or(false) {
                if let Err(e) = self.session.js_click(&button).await {
                    debug!(target: "board", error = %e, "could not close dialog");
                }
                self.pacing.settle().await;
            }
        }
    }

    async fn select_card(&self, card: &S::Element) -> bool {
        let _ = self.session.scroll_into_view(card).await;
        self.pacing.settle().await;
        if self.session.js_click(card).await.is_ok() {
            return true;
        }
        match self.session.click(card).await {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "board", error = %e, "could not open job card");
                false
            }
        }
    }

    async fn read_posting(&self) -> JobPosting {
        let title = match self
            .session
            .wait_for(Locator::Css(TITLE), self.wait_timeout)
            .await
        {
            Ok(el) => self.session.text(&el).await.unwrap_or_default(),
            Err(_) => String::new(),
        };
        let company = match self.session.try_find(Locator::Css(COMPANY)).await {
            Ok(Some(el)) => self.session.text(&el).await.unwrap_or_default(),
            _ => String::new(),
        };
        let or = |value: String, default: &str| {
            let value = value.trim().to_string();
            if value.is_empty() {
                default.to_string()
            } else {
                value
            }
        };
        JobPosting::new(or(title, UNKNOWN_TITLE), or(company, UNKNOWN_COMPANY))
    }
}

#[async_trait]
impl<S: BrowserSession> JobBoard for SearchResultsBoard<'_, S> {
    async fn next_posting(&mut self) -> Result<Option<JobPosting>> {
        if self.cards.is_none() {
            self.load_cards().await?;
        }

        loop {
            self.close_modals(DISMISS).await;

            let total = self.cards.as_ref().map_or(0, Vec::len);
            if self.cursor >= total && !self.load_more().await? {
                return Ok(None);
            }
            let Some(card) = self.cards.as_ref().and_then(|c| c.get(self.cursor)).cloned() else {
                return Ok(None);
            };
            self.cursor += 1;

            if !self.select_card(&card).await {
                continue;
            }
            self.pacing.long_settle().await;
            let posting = self.read_posting().await;
            debug!(target: "board", card = self.cursor, title = %posting.title, company = %posting.company, "posting selected");
            return Ok(Some(posting));
        }
    }

    async fn open_application(&mut self, posting: &JobPosting) -> Result<bool> {
        let mut button = None;
        for css in QUICK_APPLY_BUTTONS {
            if let Ok(found) = self
                .session
                .wait_for_clickable(Locator::Css(css), self.wait_timeout)
                .await
            {
                button = Some(found);
                break;
            }
        }
        let Some(button) = button else {
            debug!(target: "board", title = %posting.title, "no quick-apply button");
            return Ok(false);
        };

        let _ = self.session.scroll_into_view(&button).await;
        self.pacing.settle().await;
        self.session.js_click(&button).await?;
        self.pacing.long_settle().await;
        Ok(true)
    }

    async fn dismiss(&mut self) -> Result<()> {
        self.close_modals(CLOSE_DIALOGS).await;
        Ok(())
    }
}
