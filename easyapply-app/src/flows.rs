//! Scripted page flows that run before the batch: login, search, filter.

use anyhow::{bail, Context, Result};
use easyapply_drivers::{keys, BrowserSession, Locator, Pacing};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);
const RESULTS_TIMEOUT: Duration = Duration::from_secs(15);
const INPUT_TIMEOUT: Duration = Duration::from_secs(10);
const URL_POLL: Duration = Duration::from_millis(250);

const KEYWORD_INPUTS: &[&str] = &[
    "input[aria-label='Search by title, skill, or company']",
    ".jobs-search-box__text-input.jobs-search-box__keyboard-text-input",
    "input[id*='jobs-search-box-keyword']",
];
const LOCATION_INPUTS: &[&str] = &[
    "input[aria-label='City, state, or zip code']",
    "input[id*='jobs-search-box-location']",
];
const RESULTS: &str = ".jobs-search-results-list, .jobs-search__job-details";
const QUICK_APPLY_FILTER_ID: &str = "searchFilter_applyWithLinkedin";
const QUICK_APPLY_FILTER_ARIA: &str = "button[aria-label='Easy Apply filter.']";
const QUICK_APPLY_FILTER_ON: &str = "button[aria-checked='true'][aria-label='Easy Apply filter.']";

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Sign in and wait for the feed.
pub async fn login<S: BrowserSession>(
    session: &S,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    session.goto(&join(base_url, "/login")).await?;
    let username = session
        .wait_for(Locator::Id("username"), LOGIN_TIMEOUT)
        .await
        .context("login form did not load")?;
    session.send_keys(&username, email).await?;
    let password_field = session.find(Locator::Id("password")).await?;
    session.send_keys(&password_field, password).await?;
    let submit = session.find(Locator::Css("button[type='submit']")).await?;
    session.click(&submit).await?;

    let deadline = Instant::now() + LOGIN_TIMEOUT;
    loop {
        let url = session.current_url().await?;
        if url.contains("/feed") {
            info!(target: "flows", "logged in");
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!("login did not reach the feed (last url {url}); check the credentials or finish the verification challenge");
        }
        sleep(URL_POLL).await;
    }
}

async fn first_input<S: BrowserSession>(
    session: &S,
    candidates: &[&str],
) -> Option<S::Element> {
    let (first, rest) = candidates.split_first()?;
    if let Ok(el) = session
        .wait_for_clickable(Locator::Css(first), INPUT_TIMEOUT)
        .await
    {
        return Some(el);
    }
    for css in rest {
        if let Ok(Some(el)) = session.try_find(Locator::Css(css)).await {
            return Some(el);
        }
    }
    None
}

/// Run a job search from the jobs landing page.
pub async fn search<S: BrowserSession>(
    session: &S,
    base_url: &str,
    keywords: &str,
    location: &str,
    pacing: &Pacing,
) -> Result<()> {
    session.goto(&join(base_url, "/jobs/")).await?;
    pacing.long_settle().await;

    let Some(keyword_input) = first_input(session, KEYWORD_INPUTS).await else {
        bail!("job title search input not found");
    };
    session.clear(&keyword_input).await?;
    session.send_keys(&keyword_input, keywords).await?;
    pacing.settle().await;

    let Some(location_input) = first_input(session, LOCATION_INPUTS).await else {
        bail!("location search input not found");
    };
    session.clear(&location_input).await?;
    session.send_keys(&location_input, location).await?;
    pacing.settle().await;
    session.send_keys(&location_input, keys::ENTER).await?;
    pacing.long_settle().await;

    if session
        .wait_for(Locator::Css(RESULTS), RESULTS_TIMEOUT)
        .await
        .is_ok()
    {
        info!(target: "flows", %keywords, %location, "search results loaded");
        return Ok(());
    }
    let url = session.current_url().await?;
    if url.contains("keywords=") && (url.contains("location=") || url.contains("geoId=")) {
        info!(target: "flows", %url, "search url detected");
        return Ok(());
    }
    bail!("could not confirm the job search (url {url})")
}

/// Restrict results to quick-apply postings. Returns whether the filter was
/// confirmed active; a missing filter is not fatal.
pub async fn apply_quick_apply_filter<S: BrowserSession>(
    session: &S,
    pacing: &Pacing,
) -> Result<bool> {
    let button = match session
        .wait_for_clickable(Locator::Id(QUICK_APPLY_FILTER_ID), INPUT_TIMEOUT)
        .await
    {
        Ok(button) => Some(button),
        Err(_) => match session.try_find(Locator::Css(QUICK_APPLY_FILTER_ARIA)).await? {
            Some(button) => Some(button),
            None => {
                let mut found = None;
                for button in session.find_all(Locator::Css("button")).await? {
                    if session.text(&button).await?.contains("Easy Apply") {
                        found = Some(button);
                        break;
                    }
                }
                found
            }
        },
    };
    let Some(button) = button else {
        warn!(target: "flows", "quick-apply filter not found; continuing unfiltered");
        return Ok(false);
    };

    session.js_click(&button).await?;
    pacing.long_settle().await;

    let active = session
        .try_find(Locator::Css(QUICK_APPLY_FILTER_ON))
        .await?
        .is_some();
    if active {
        info!(target: "flows", "quick-apply filter active");
    } else {
        warn!(target: "flows", "could not confirm the quick-apply filter");
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyapply_drivers::{FakeBrowser, FakeEvent};

    #[tokio::test]
    async fn login_types_credentials_and_reaches_feed() {
        let browser = FakeBrowser::with_page(
            r#"<form>
                 <input id="username"><input id="password" type="password">
                 <button type="submit" data-href="https://site.test/feed/">Sign in</button>
               </form>"#,
        );
        login(&browser, "https://site.test/", "ada@example.com", "hunter2")
            .await
            .unwrap();

        let events = browser.events();
        assert_eq!(events[0], FakeEvent::Goto("https://site.test/login".into()));
        assert_eq!(browser.value_of("#username").as_deref(), Some("ada@example.com"));
        assert_eq!(browser.value_of("#password").as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn search_fills_both_inputs() {
        let browser = FakeBrowser::with_page(
            r#"<input aria-label="Search by title, skill, or company" id="kw" value="old">
               <input id="jobs-search-box-location-1" type="text">
               <div class="jobs-search-results-list"></div>"#,
        );
        search(&browser, "https://site.test", "Rust engineer", "Berlin", &Pacing::instant())
            .await
            .unwrap();

        assert_eq!(browser.value_of("#kw").as_deref(), Some("Rust engineer"));
        assert_eq!(
            browser.value_of("#jobs-search-box-location-1").as_deref(),
            Some("Berlin")
        );
    }

    #[tokio::test]
    async fn search_without_inputs_fails() {
        let browser = FakeBrowser::with_page("<div></div>");
        let err = search(&browser, "https://site.test", "Rust", "Berlin", &Pacing::instant())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("job title"));
    }

    #[tokio::test]
    async fn filter_falls_back_to_button_text() {
        let browser = FakeBrowser::new([
            r#"<button>Date posted</button><button data-goto="1">Easy Apply</button>"#,
            r#"<button aria-label="Easy Apply filter." aria-checked="true">Easy Apply</button>"#,
        ]);
        assert!(apply_quick_apply_filter(&browser, &Pacing::instant()).await.unwrap());
        assert_eq!(browser.clicks(), vec!["Easy Apply"]);
    }

    #[tokio::test]
    async fn missing_filter_is_not_fatal() {
        let browser = FakeBrowser::with_page("<button>Remote</button>");
        assert!(!apply_quick_apply_filter(&browser, &Pacing::instant()).await.unwrap());
    }
}
