//! Setting field values when the page fights back
//!
//! Keystrokes come first. Some inputs (date pickers, masked or read-only
//! fields) refuse them with an invalid-element-state error; for those the
//! value is assigned by script and synthetic `input`/`change` events are
//! dispatched so framework bindings see the change.

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, warn};

use crate::driver::Browser;

/// Assigns `arguments[1]` to the element and fires bubbling input/change events
pub const SET_VALUE_SCRIPT: &str = "arguments[0].value = arguments[1]; \
arguments[0].dispatchEvent(new Event('input', {bubbles: true})); \
arguments[0].dispatchEvent(new Event('change', {bubbles: true}));";

/// How a value ended up in a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Typed,
    Scripted,
    Failed(String),
}

impl InputOutcome {
    pub fn is_set(&self) -> bool {
        !matches!(self, InputOutcome::Failed(_))
    }
}

/// Replace the element's value with `text`
pub async fn set_value<B: Browser>(browser: &B, element: &B::Element, text: &str) -> InputOutcome {
    let typed = async {
        browser.clear(element).await?;
        browser.send_keys(element, text).await
    };

    match typed.await {
        Ok(()) => InputOutcome::Typed,
        Err(e) if e.is_invalid_element_state() => {
            debug!("Keystrokes rejected ({}), assigning by script", e);
            match browser
                .execute_script(SET_VALUE_SCRIPT, element, vec![json!(text)])
                .await
            {
                Ok(_) => InputOutcome::Scripted,
                Err(e) => {
                    warn!("Scripted assignment failed: {}", e);
                    InputOutcome::Failed(e.to_string())
                }
            }
        }
        Err(e) => InputOutcome::Failed(e.to_string()),
    }
}

/// Text layout expected by a date field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFieldKind {
    /// `<input type="date">`, wants `YYYY-MM-DD`
    Native,
    /// Anything else, wants `DD/MM/YYYY`
    Text,
}

impl DateFieldKind {
    pub fn from_input_type(input_type: Option<&str>) -> Self {
        match input_type {
            Some(t) if t.trim().eq_ignore_ascii_case("date") => DateFieldKind::Native,
            _ => DateFieldKind::Text,
        }
    }

    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateFieldKind::Native => date.format("%Y-%m-%d").to_string(),
            DateFieldKind::Text => date.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Set a date, formatted for the field's `type`
pub async fn set_date<B: Browser>(browser: &B, element: &B::Element, date: NaiveDate) -> InputOutcome {
    let input_type = browser.attribute(element, "type").await.ok().flatten();
    let text = DateFieldKind::from_input_type(input_type.as_deref()).format(date);
    set_value(browser, element, &text).await
}

/// Choose a `<select>` option by position
pub async fn select_index<B: Browser>(browser: &B, element: &B::Element, index: usize) -> InputOutcome {
    match browser.select_by_index(element, index).await {
        Ok(()) => InputOutcome::Typed,
        Err(e) => InputOutcome::Failed(e.to_string()),
    }
}
