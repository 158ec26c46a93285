//! Element lookup strategies evaluated against a rendered DOM snapshot.
//!
//! A [`Strategy`] list is tried in order; the first visible, enabled element
//! any strategy matches wins. Matches are addressed by a structural CSS path
//! so the browser can click exactly that element.

use std::fmt;

use burgerwatch_shared::{BurgerWatchError, Result};
use scraper::{ElementRef, Html, Selector};

use crate::extract::element_text;

// ---------------------------------------------------------------------------
// Locators
// ---------------------------------------------------------------------------

/// How to find candidate elements in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector.
    Css(String),
    /// Elements of `tag` whose cleaned text equals `text`.
    ExactText { tag: String, text: String },
    /// Elements of `tag` whose cleaned text contains `keyword`.
    ContainsText { tag: String, keyword: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn exact(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ExactText {
            tag: tag.into(),
            text: text.into(),
        }
    }

    pub fn contains(tag: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::ContainsText {
            tag: tag.into(),
            keyword: keyword.into(),
        }
    }

    /// Candidate elements in document order.
    fn candidates<'a>(&self, doc: &'a Html) -> Result<Vec<ElementRef<'a>>> {
        // (text, exact) when the locator also tests element text
        let (selector, wanted) = match self {
            Self::Css(css) => (css.as_str(), None),
            Self::ExactText { tag, text } => (tag.as_str(), Some((text.as_str(), true))),
            Self::ContainsText { tag, keyword } => (tag.as_str(), Some((keyword.as_str(), false))),
        };

        let sel = Selector::parse(selector)
            .map_err(|e| BurgerWatchError::parse(format!("invalid selector '{selector}': {e}")))?;

        Ok(doc
            .select(&sel)
            .filter(|el| match wanted {
                None => true,
                Some((text, true)) => element_text(el) == text,
                Some((keyword, false)) => element_text(el).contains(keyword),
            })
            .collect())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css `{css}`"),
            Self::ExactText { tag, text } => write!(f, "<{tag}> text == \"{text}\""),
            Self::ContainsText { tag, keyword } => write!(f, "<{tag}> text contains \"{keyword}\""),
        }
    }
}

/// One entry of an ordered fallback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub locator: Locator,
    /// Poll until the session's implicit wait elapses instead of looking once.
    pub wait: bool,
}

impl Strategy {
    /// Look once.
    pub fn now(locator: Locator) -> Self {
        Self {
            locator,
            wait: false,
        }
    }

    /// Poll for up to the implicit wait.
    pub fn waiting(locator: Locator) -> Self {
        Self {
            locator,
            wait: true,
        }
    }
}

/// Describe a strategy list for error messages.
pub fn describe(strategies: &[Strategy]) -> String {
    strategies
        .iter()
        .map(|s| s.locator.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// A located element: unique CSS path plus its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMatch {
    pub selector: String,
    pub text: String,
}

/// First visible, enabled element in `html` that `locator` matches.
pub fn find_in(html: &str, locator: &Locator) -> Result<Option<ElementMatch>> {
    let doc = Html::parse_document(html);
    Ok(locator
        .candidates(&doc)?
        .into_iter()
        .find(|el| is_visible(el) && is_enabled(el))
        .map(|el| ElementMatch {
            selector: css_path(&el),
            text: element_text(&el),
        }))
}

/// False when the element or an ancestor is hidden by attribute or inline style.
pub fn is_visible(el: &ElementRef<'_>) -> bool {
    let mut current = Some(*el);
    while let Some(node) = current {
        let v = node.value();
        if v.attr("hidden").is_some() || v.attr("aria-hidden") == Some("true") {
            return false;
        }
        if let Some(style) = v.attr("style") {
            let style: String = style
                .to_ascii_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if style.contains("display:none") || style.contains("visibility:hidden") {
                return false;
            }
        }
        current = node.parent().and_then(ElementRef::wrap);
    }
    true
}

/// False when the element carries `disabled` or `aria-disabled="true"`.
pub fn is_enabled(el: &ElementRef<'_>) -> bool {
    let v = el.value();
    v.attr("disabled").is_none() && v.attr("aria-disabled") != Some("true")
}

/// Structural `:nth-child` path from the root element down to `el`.
pub fn css_path(el: &ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(*el);
    while let Some(node) = current {
        let name = node.value().name();
        if name == "html" {
            segments.push(name.to_string());
            break;
        }
        let index = 1 + node
            .prev_siblings()
            .filter(|n| n.value().is_element())
            .count();
        segments.push(format!("{name}:nth-child({index})"));
        current = node.parent().and_then(ElementRef::wrap);
    }
    segments.reverse();
    segments.join(" > ")
}

/// Text of an element addressed by a CSS path, cleaned. Used by fixture pages
/// to resolve what a click landed on.
pub fn text_at(html: &str, css_path: &str) -> Option<(Option<String>, String)> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse(css_path).ok()?;
    let el = doc.select(&sel).next()?;
    let id = el.value().attr("id").map(str::to_string);
    Some((id, element_text(&el)))
}
