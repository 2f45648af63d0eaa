//! Browser boundary
//!
//! Everything above this module talks to the browser through [`Browser`], so
//! the flows run unchanged against a live WebDriver session or the in-memory
//! [`crate::fake::FakeBrowser`].

pub mod process;
pub mod webdriver;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::E2eResult;

/// One way of finding an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id(String),
    Name(String),
    Css(String),
    /// `[data-testid='...']`
    TestId(String),
    /// Element with this tag whose normalized text contains `text`
    Text { tag: String, text: String },
    /// Element with this tag whose normalized text is exactly `text`
    ExactText { tag: String, text: String },
    /// Like `Text`, but only inside an open dialog
    DialogText { tag: String, text: String },
    XPath(String),
}

impl Strategy {
    pub fn id(value: impl Into<String>) -> Self {
        Strategy::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Strategy::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Strategy::Css(value.into())
    }

    pub fn test_id(value: impl Into<String>) -> Self {
        Strategy::TestId(value.into())
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Strategy::Text {
            tag: "button".to_string(),
            text: text.into(),
        }
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Strategy::Text {
            tag: "a".to_string(),
            text: text.into(),
        }
    }

    /// Button whose whole label is `text`
    pub fn button_exact(text: impl Into<String>) -> Self {
        Strategy::ExactText {
            tag: "button".to_string(),
            text: text.into(),
        }
    }

    /// Button showing `text` inside a dialog container
    pub fn dialog_button(text: impl Into<String>) -> Self {
        Strategy::DialogText {
            tag: "button".to_string(),
            text: text.into(),
        }
    }

    /// CSS form for strategies that have one
    pub fn to_css(&self) -> Option<String> {
        match self {
            Strategy::Id(id) => Some(format!("#{}", id)),
            Strategy::Name(name) => Some(format!("[name='{}']", name)),
            Strategy::Css(css) => Some(css.clone()),
            Strategy::TestId(id) => Some(format!("[data-testid='{}']", id)),
            Strategy::Text { .. }
            | Strategy::ExactText { .. }
            | Strategy::DialogText { .. }
            | Strategy::XPath(_) => None,
        }
    }

    /// XPath form for text matches
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Strategy::Text { tag, text } => Some(format!(
                "//{}[contains(normalize-space(.), {})]",
                tag,
                xpath_literal(text)
            )),
            Strategy::ExactText { tag, text } => Some(format!(
                "//{}[normalize-space(.)={}]",
                tag,
                xpath_literal(text)
            )),
            Strategy::DialogText { tag, text } => Some(format!(
                "//*[{}]//{}[contains(normalize-space(.), {})]",
                DIALOG_CONTAINER,
                tag,
                xpath_literal(text)
            )),
            Strategy::XPath(xpath) => Some(xpath.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Id(v) => write!(f, "id={}", v),
            Strategy::Name(v) => write!(f, "name={}", v),
            Strategy::Css(v) => write!(f, "css={}", v),
            Strategy::TestId(v) => write!(f, "testid={}", v),
            Strategy::Text { tag, text } => write!(f, "{}~'{}'", tag, text),
            Strategy::ExactText { tag, text } => write!(f, "{}='{}'", tag, text),
            Strategy::DialogText { tag, text } => write!(f, "dialog {}~'{}'", tag, text),
            Strategy::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// XPath predicate for modal containers
const DIALOG_CONTAINER: &str = "@role='dialog' or @role='alertdialog' \
or contains(concat(' ', normalize-space(@class), ' '), ' modal ') \
or contains(@data-testid, 'confirm-modal')";

fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A browser session as seen by the flows
#[async_trait]
pub trait Browser: Send + Sync {
    /// Live element handle
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    async fn page_source(&self) -> E2eResult<String>;

    /// First match in the current browsing context, `None` when absent
    async fn find(&self, strategy: &Strategy) -> E2eResult<Option<Self::Element>>;

    async fn find_all(&self, strategy: &Strategy) -> E2eResult<Vec<Self::Element>>;

    async fn click(&self, element: &Self::Element) -> E2eResult<()>;

    async fn clear(&self, element: &Self::Element) -> E2eResult<()>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> E2eResult<()>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> E2eResult<Option<String>>;

    async fn is_displayed(&self, element: &Self::Element) -> E2eResult<bool>;

    async fn select_by_index(&self, element: &Self::Element, index: usize) -> E2eResult<()>;

    /// Run `script` with `element` as `arguments[0]` and `args` after it
    async fn execute_script(
        &self,
        script: &str,
        element: &Self::Element,
        args: Vec<Value>,
    ) -> E2eResult<Value>;

    async fn enter_frame(&self, frame: &Self::Element) -> E2eResult<()>;

    async fn enter_default_frame(&self) -> E2eResult<()>;

    async fn screenshot(&self, path: &Path) -> E2eResult<()>;

    async fn quit(&self) -> E2eResult<()>;
}

/// Opens a fresh browser session for each test case
#[async_trait]
pub trait Launcher: Send + Sync {
    type Browser: Browser;

    async fn launch(&self) -> E2eResult<Self::Browser>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_maps_to_attribute_selector() {
        assert_eq!(
            Strategy::test_id("trip-require-title").to_css().unwrap(),
            "[data-testid='trip-require-title']"
        );
        assert_eq!(Strategy::name("title").to_css().unwrap(), "[name='title']");
        assert!(Strategy::button_text("Pay").to_css().is_none());
    }

    #[test]
    fn text_strategies_become_normalized_xpath() {
        assert_eq!(
            Strategy::button_text("ยืนยัน").to_xpath().unwrap(),
            "//button[contains(normalize-space(.), 'ยืนยัน')]"
        );
        assert_eq!(
            Strategy::link_text("Don't").to_xpath().unwrap(),
            "//a[contains(normalize-space(.), \"Don't\")]"
        );
    }

    #[test]
    fn exact_and_dialog_text_xpath() {
        assert_eq!(
            Strategy::button_exact("ยืนยัน").to_xpath().unwrap(),
            "//button[normalize-space(.)='ยืนยัน']"
        );
        let dialog = Strategy::dialog_button("OK").to_xpath().unwrap();
        assert!(dialog.starts_with("//*[@role='dialog' or "));
        assert!(dialog.ends_with("]//button[contains(normalize-space(.), 'OK')]"));
        assert!(dialog.contains("' modal '"));
    }

    #[test]
    fn xpath_literal_with_both_quotes() {
        assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a', "'", 'b"c')"#);
    }
}
