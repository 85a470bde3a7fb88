//! Field classification and label resolution.
//!
//! Every lookup here degrades to an empty result: a missing label is a normal
//! outcome, never an error.

use easyapply_common::Result;
use easyapply_drivers::{BrowserSession, Locator};
use tracing::debug;

/// Vertical distance within which a "?" element counts as a field's label.
pub const PROXIMITY_PX: f64 = 200.0;

const PRECEDING_LABEL_XPATH: &str = "preceding::*[self::p or self::h1 or self::h2 or self::h3 or self::h4 or self::span or self::label or self::legend][position() <= 3]";
const QUESTION_CANDIDATES: &str = "p, span, label, legend, h1, h2, h3, h4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Select,
    Radio,
    Checkbox,
    File,
    Unknown,
}

impl FieldKind {
    /// Kind from tag name and `type` attribute.
    pub fn from_markup(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::TextArea,
            "input" => {
                let ty = input_type.unwrap_or("").trim().to_ascii_lowercase();
                match ty.as_str() {
                    "radio" => FieldKind::Radio,
                    "checkbox" => FieldKind::Checkbox,
                    "file" => FieldKind::File,
                    "" | "text" | "email" | "tel" | "url" | "number" | "search" => FieldKind::Text,
                    _ => FieldKind::Unknown,
                }
            }
            _ => FieldKind::Unknown,
        }
    }
}

/// One classified form control on the current step.
#[derive(Debug, Clone)]
pub struct FormControl<E> {
    pub element: E,
    pub kind: FieldKind,
    /// Lower-cased `id name aria-label label`.
    pub identifier: String,
    pub id: String,
    pub name: String,
    pub label: String,
}

/// Collapse runs of whitespace to single spaces.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_identifier(parts: &[&str]) -> String {
    parts.join(" ").to_lowercase()
}

/// Classify `element` and resolve its label through every strategy.
pub async fn classify<S: BrowserSession>(
    session: &S,
    element: &S::Element,
) -> Result<FormControl<S::Element>> {
    let tag = session.tag_name(element).await?;
    let input_type = session.attr(element, "type").await.ok().flatten();
    let kind = FieldKind::from_markup(&tag, input_type.as_deref());

    let id = session.attr_or_empty(element, "id").await;
    let name = session.attr_or_empty(element, "name").await;
    let aria = session.attr_or_empty(element, "aria-label").await;
    let label = resolve_label(session, element, &id).await;

    let identifier = join_identifier(&[&id, &name, &aria, &label]);
    debug!(target: "wizard.classify", ?kind, %identifier, "classified field");

    Ok(FormControl {
        element: element.clone(),
        kind,
        identifier,
        id,
        name,
        label,
    })
}

/// Full label resolution: explicit `for`, nearby label, preceding question
/// text, then the nearest "?" element by vertical distance.
pub async fn resolve_label<S: BrowserSession>(session: &S, element: &S::Element, id: &str) -> String {
    let own = own_label(session, element, id).await;
    if !own.is_empty() {
        return own;
    }
    question_context(session, element).await
}

/// Strategies 1–2 only: the control's own label.
pub async fn own_label<S: BrowserSession>(session: &S, element: &S::Element, id: &str) -> String {
    let explicit = label_for(session, id).await;
    if !explicit.is_empty() {
        return explicit;
    }
    nearby_label(session, element).await
}

/// Strategies 3–4 only: question text around the control.
pub async fn question_context<S: BrowserSession>(session: &S, element: &S::Element) -> String {
    let preceding = preceding_question(session, element, 0).await;
    if !preceding.is_empty() {
        return preceding;
    }
    nearest_question(session, element).await
}

/// Text of `label[for=id]`.
pub async fn label_for<S: BrowserSession>(session: &S, id: &str) -> String {
    if id.is_empty() || id.contains('\'') {
        return String::new();
    }
    let css = format!("label[for='{id}']");
    match session.try_find(Locator::Css(&css)).await {
        Ok(Some(label)) => text_of(session, &label).await,
        _ => String::new(),
    }
}

/// First non-empty `label` under the control's parent.
pub async fn nearby_label<S: BrowserSession>(session: &S, element: &S::Element) -> String {
    let Ok(parent) = session.parent(element).await else {
        return String::new();
    };
    first_text(session, &parent, "label", 0).await
}

/// Nearest of the three closest preceding text blocks that reads like a
/// question: contains "?" and is longer than `min_len` characters.
pub async fn preceding_question<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    min_len: usize,
) -> String {
    preceding_question_in(session, element, PRECEDING_LABEL_XPATH, min_len).await
}

pub(crate) async fn preceding_question_in<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    xpath: &str,
    min_len: usize,
) -> String {
    let Ok(blocks) = session.find_all_from(element, Locator::XPath(xpath)).await else {
        return String::new();
    };
    // Node-sets arrive in document order; the nearest block is last.
    for block in blocks.into_iter().rev() {
        let text = text_of(session, &block).await;
        if text.contains('?') && text.chars().count() > min_len {
            return text;
        }
    }
    String::new()
}

/// Closest element containing "?" whose vertical centre lies within
/// [`PROXIMITY_PX`] of the control's.
pub async fn nearest_question<S: BrowserSession>(session: &S, element: &S::Element) -> String {
    let Ok(anchor) = session.bounds(element).await else {
        return String::new();
    };
    let Ok(candidates) = session.find_all(Locator::Css(QUESTION_CANDIDATES)).await else {
        return String::new();
    };

    let anchor_centre = anchor.y + anchor.height / 2.0;
    let mut best: Option<(f64, String)> = None;
    for candidate in candidates {
        let text = text_of(session, &candidate).await;
        if !text.contains('?') {
            continue;
        }
        let Ok(rect) = session.bounds(&candidate).await else {
            continue;
        };
        let distance = (rect.y + rect.height / 2.0 - anchor_centre).abs();
        if distance < PROXIMITY_PX && best.as_ref().map_or(true, |(d, _)| distance < *d) {
            best = Some((distance, text));
        }
    }
    best.map(|(_, text)| text).unwrap_or_default()
}

/// Whitespace-normalised text, empty on error.
pub async fn text_of<S: BrowserSession>(session: &S, element: &S::Element) -> String {
    session
        .text(element)
        .await
        .map(|t| normalize_space(&t))
        .unwrap_or_default()
}

/// First descendant of `scope` matching `css` whose text is longer than
/// `min_len` characters.
pub async fn first_text<S: BrowserSession>(
    session: &S,
    scope: &S::Element,
    css: &str,
    min_len: usize,
) -> String {
    let Ok(found) = session.find_all_from(scope, Locator::Css(css)).await else {
        return String::new();
    };
    for el in found {
        let text = text_of(session, &el).await;
        if !text.is_empty() && text.chars().count() > min_len {
            return text;
        }
    }
    String::new()
}

/// Prompt of a radio group: `fieldset > legend` of the nearest enclosing
/// fieldset, else the question context of its first member.
pub async fn radio_group_prompt<S: BrowserSession>(session: &S, first_member: &S::Element) -> String {
    let mut current = first_member.clone();
    for _ in 0..4 {
        let Ok(parent) = session.parent(&current).await else {
            break;
        };
        if session.tag_name(&parent).await.ok().as_deref() == Some("fieldset") {
            let legend = first_text(session, &parent, "legend", 0).await;
            if !legend.is_empty() {
                return legend;
            }
            break;
        }
        current = parent;
    }
    question_context(session, first_member).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyapply_drivers::FakeBrowser;

    #[test]
    fn kinds_follow_tag_and_type() {
        assert_eq!(FieldKind::from_markup("SELECT", Some("text")), FieldKind::Select);
        assert_eq!(FieldKind::from_markup("textarea", None), FieldKind::TextArea);
        assert_eq!(FieldKind::from_markup("input", None), FieldKind::Text);
        assert_eq!(FieldKind::from_markup("input", Some("Email")), FieldKind::Text);
        assert_eq!(FieldKind::from_markup("input", Some("radio")), FieldKind::Radio);
        assert_eq!(FieldKind::from_markup("input", Some("file")), FieldKind::File);
        assert_eq!(FieldKind::from_markup("input", Some("hidden")), FieldKind::Unknown);
        assert_eq!(FieldKind::from_markup("input", Some("submit")), FieldKind::Unknown);
        assert_eq!(FieldKind::from_markup("button", None), FieldKind::Unknown);
    }

    #[tokio::test]
    async fn identifier_joins_attributes_and_explicit_label() {
        let browser = FakeBrowser::with_page(
            r#"<div>
                 <label for="phoneNumber">Mobile Phone</label>
                 <input id="phoneNumber" name="PHONE" aria-label="Contact">
               </div>"#,
        );
        let input = browser.find(Locator::Id("phoneNumber")).await.unwrap();
        let field = classify(&browser, &input).await.unwrap();
        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.identifier, "phonenumber phone contact mobile phone");
    }

    #[tokio::test]
    async fn label_falls_back_to_parent_then_question_text() {
        let browser = FakeBrowser::with_page(
            r#"<form>
                 <div><label>City</label><input id="a"></div>
                 <h3>How many years of Rust?</h3>
                 <div><input id="b"></div>
               </form>"#,
        );
        let a = browser.find(Locator::Id("a")).await.unwrap();
        let b = browser.find(Locator::Id("b")).await.unwrap();
        assert_eq!(resolve_label(&browser, &a, "a").await, "City");
        assert_eq!(
            resolve_label(&browser, &b, "b").await,
            "How many years of Rust?"
        );
    }

    #[tokio::test]
    async fn nearest_preceding_question_wins() {
        let browser = FakeBrowser::with_page(
            r#"<form>
                 <p>Do you hold a work permit?</p>
                 <p>How many years of Rust?</p>
                 <div><input id="years"></div>
               </form>"#,
        );
        let years = browser.find(Locator::Id("years")).await.unwrap();
        assert_eq!(
            preceding_question(&browser, &years, 10).await,
            "How many years of Rust?"
        );
        assert_eq!(
            resolve_label(&browser, &years, "years").await,
            "How many years of Rust?"
        );
    }

    #[tokio::test]
    async fn proximity_is_capped() {
        let browser = FakeBrowser::with_page(
            r#"<form>
                 <input id="far" data-y="600">
                 <span data-y="100">Why us?</span>
                 <input id="near" data-y="150">
               </form>"#,
        );
        let far = browser.find(Locator::Id("far")).await.unwrap();
        let near = browser.find(Locator::Id("near")).await.unwrap();
        assert_eq!(nearest_question(&browser, &far).await, "");
        assert_eq!(nearest_question(&browser, &near).await, "Why us?");
    }

    #[tokio::test]
    async fn radio_group_prefers_legend() {
        let browser = FakeBrowser::with_page(
            r#"<fieldset>
                 <legend>Are you willing to relocate?</legend>
                 <div><input type="radio" name="q1" id="q1-yes" value="Yes"><label for="q1-yes">Yes</label></div>
               </fieldset>"#,
        );
        let radio = browser.find(Locator::Id("q1-yes")).await.unwrap();
        assert_eq!(
            radio_group_prompt(&browser, &radio).await,
            "Are you willing to relocate?"
        );
        assert_eq!(own_label(&browser, &radio, "q1-yes").await, "Yes");
    }
}
