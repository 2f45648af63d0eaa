//! In-memory browser for exercising flows without a WebDriver
//!
//! A [`Site`] maps URL paths to page builders and owns a small key/value
//! [`Memory`] standing in for the backend, shared by every session it
//! launches. [`FakeBrowser`] renders one page at a time, hands out element
//! handles that go stale on navigation, tracks the current frame, and logs
//! lookups, synthetic events and screenshots so tests can assert on them.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::driver::{Browser, Launcher, Strategy};
use crate::error::{E2eError, E2eResult};
use crate::input::SET_VALUE_SCRIPT;

/// Behaviour attached to a clickable element
pub type Action = Arc<dyn Fn(&mut ClickScope<'_>) + Send + Sync>;

type PageBuilder = Arc<dyn Fn(&Request<'_>) -> Page + Send + Sync>;

/// One element on a fake page
#[derive(Clone)]
pub struct FakeElement {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    read_only: bool,
    script_fails: bool,
    displayed: bool,
    in_dialog: bool,
    frame: Option<usize>,
    frame_target: Option<usize>,
    broken_frame: bool,
    appears_after: u32,
    on_click: Option<Action>,
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            read_only: false,
            script_fails: false,
            displayed: true,
            in_dialog: false,
            frame: None,
            frame_target: None,
            broken_frame: false,
            appears_after: 0,
            on_click: None,
        }
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").text(text)
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self::new("a").text(text).attr("href", href)
    }

    /// `<input>` with both `id` and `name` set to `key`
    pub fn input(key: &str) -> Self {
        Self::new("input").id(key).name(key)
    }

    pub fn textarea(name: &str) -> Self {
        Self::new("textarea").name(name)
    }

    pub fn select(name: &str) -> Self {
        Self::new("select").name(name)
    }

    /// `<iframe>` whose content is frame `index`
    pub fn iframe(index: usize) -> Self {
        let mut element = Self::new("iframe");
        element.frame_target = Some(index);
        element
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn test_id(self, id: &str) -> Self {
        self.attr("data-testid", id)
    }

    pub fn kind(self, input_type: &str) -> Self {
        self.attr("type", input_type)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Keystrokes and clear fail with an invalid-element-state error
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Scripted value assignment fails too
    pub fn script_fails(mut self) -> Self {
        self.script_fails = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Render the element inside an open `role="dialog"` container
    pub fn in_dialog(mut self) -> Self {
        self.in_dialog = true;
        self
    }

    /// Place the element inside frame `index`
    pub fn in_frame(mut self, index: usize) -> Self {
        self.frame = Some(index);
        self
    }

    /// Lookups inside this iframe's content fail
    pub fn broken(mut self) -> Self {
        self.broken_frame = true;
        self
    }

    /// Invisible to the first `polls` lookups that would match it
    pub fn appears_after(mut self, polls: u32) -> Self {
        self.appears_after = polls;
        self
    }

    pub fn on_click<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ClickScope<'_>) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(action));
        self
    }

    fn key(&self) -> String {
        ["id", "name", "data-testid"]
            .iter()
            .find_map(|k| self.attrs.get(*k).cloned())
            .unwrap_or_else(|| self.tag.clone())
    }

    fn answers_to(&self, key: &str) -> bool {
        ["id", "name", "data-testid"]
            .iter()
            .any(|k| self.attrs.get(*k).map(|v| v == key).unwrap_or(false))
    }

    fn matches(&self, strategy: &Strategy) -> E2eResult<bool> {
        Ok(match strategy {
            Strategy::Id(id) => self.attrs.get("id") == Some(id),
            Strategy::Name(name) => self.attrs.get("name") == Some(name),
            Strategy::TestId(id) => self.attrs.get("data-testid") == Some(id),
            Strategy::Text { tag, text } => {
                self.tag == *tag && normalize(&self.text).contains(&normalize(text))
            }
            Strategy::ExactText { tag, text } => {
                self.tag == *tag && normalize(&self.text) == normalize(text)
            }
            Strategy::DialogText { tag, text } => {
                self.in_dialog
                    && self.tag == *tag
                    && normalize(&self.text).contains(&normalize(text))
            }
            Strategy::Css(css) => {
                let compounds = parse_selector(css).ok_or_else(|| {
                    E2eError::WebDriver(format!("invalid selector: {}", css))
                })?;
                compounds.iter().any(|c| c.matches(self))
            }
            Strategy::XPath(xpath) => {
                return Err(E2eError::WebDriver(format!(
                    "xpath not supported by fake browser: {}",
                    xpath
                )))
            }
        })
    }
}

/// A rendered page
#[derive(Clone, Default)]
pub struct Page {
    elements: Vec<FakeElement>,
    body: String,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Free text that shows up in the page source
    pub fn body(mut self, text: &str) -> Self {
        self.body.push_str(text);
        self.body.push('\n');
        self
    }
}

/// What a page builder sees
pub struct Request<'a> {
    pub url: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub memory: &'a Memory,
}

impl Request<'_> {
    /// First all-digit path segment
    pub fn id(&self) -> Option<u64> {
        self.path
            .split('/')
            .find(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Backend state shared by every session of a [`Site`]
#[derive(Default)]
pub struct Memory {
    entries: Mutex<BTreeMap<String, String>>,
}

impl Memory {
    pub fn remember(&self, key: &str, value: impl Into<String>) {
        self.entries.lock().insert(key.to_string(), value.into());
    }

    pub fn recall(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Increment the counter stored under `key` and return the new value
    pub fn next_id(&self, key: &str) -> u64 {
        let mut entries = self.entries.lock();
        let next = entries
            .get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        entries.insert(key.to_string(), next.to_string());
        next
    }
}

/// Counters across every session a [`Site`] launched
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub opened: usize,
    pub closed: usize,
    pub screenshots: Vec<PathBuf>,
}

#[derive(Default)]
struct SiteInner {
    routes: Mutex<Vec<(String, PageBuilder)>>,
    memory: Memory,
    stats: Mutex<SessionStats>,
}

/// Scripted application: routes plus backend memory
#[derive(Clone, Default)]
pub struct Site {
    inner: Arc<SiteInner>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page for `pattern`; `{id}` matches a numeric segment and
    /// `*` any segment. The first registered match wins.
    pub fn page<F>(self, pattern: &str, build: F) -> Self
    where
        F: Fn(&Request<'_>) -> Page + Send + Sync + 'static,
    {
        self.inner
            .routes
            .lock()
            .push((pattern.to_string(), Arc::new(build)));
        self
    }

    pub fn memory(&self) -> &Memory {
        &self.inner.memory
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.stats.lock().clone()
    }

    pub fn browser(&self) -> FakeBrowser {
        self.inner.stats.lock().opened += 1;
        FakeBrowser {
            site: self.clone(),
            state: Mutex::new(FakeState::default()),
        }
    }

    fn render(&self, url: &str) -> Page {
        let (path, query) = split_url(url);
        let builder = self
            .inner
            .routes
            .lock()
            .iter()
            .find(|(pattern, _)| path_matches(pattern, path))
            .map(|(_, builder)| builder.clone());

        match builder {
            Some(build) => build(&Request {
                url,
                path,
                query,
                memory: &self.inner.memory,
            }),
            None => Page::new().body("404 Not Found"),
        }
    }
}

#[async_trait]
impl Launcher for Site {
    type Browser = FakeBrowser;

    async fn launch(&self) -> E2eResult<FakeBrowser> {
        Ok(self.browser())
    }
}

/// Synthetic DOM event dispatched by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEvent {
    pub field: String,
    pub event: String,
}

struct Live {
    handle: u64,
    element: FakeElement,
}

struct FakeState {
    url: String,
    body: String,
    elements: Vec<Live>,
    next_handle: u64,
    frame: Option<usize>,
    frame_log: Vec<Option<usize>>,
    lookups: Vec<Strategy>,
    events: Vec<FieldEvent>,
    quit: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            body: String::new(),
            elements: Vec::new(),
            next_handle: 1,
            frame: None,
            frame_log: Vec::new(),
            lookups: Vec::new(),
            events: Vec::new(),
            quit: false,
        }
    }
}

impl FakeState {
    fn push(&mut self, element: FakeElement) {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.elements.push(Live { handle, element });
    }

    fn show(&mut self, url: String, page: Page) {
        self.url = url;
        self.body = page.body;
        self.elements.clear();
        self.frame = None;
        for element in page.elements {
            self.push(element);
        }
    }

    fn live(&mut self, handle: &FakeHandle) -> E2eResult<&mut FakeElement> {
        self.elements
            .iter_mut()
            .find(|l| l.handle == handle.0)
            .map(|l| &mut l.element)
            .ok_or_else(|| {
                E2eError::WebDriver(format!(
                    "stale element reference: element {} is not attached to the page document",
                    handle.0
                ))
            })
    }

    fn in_broken_frame(&self) -> bool {
        let Some(frame) = self.frame else {
            return false;
        };
        self.elements
            .iter()
            .any(|l| l.element.frame_target == Some(frame) && l.element.broken_frame)
    }

    fn lookup(&mut self, strategy: &Strategy) -> E2eResult<Vec<FakeHandle>> {
        self.lookups.push(strategy.clone());
        if self.quit {
            return Err(E2eError::WebDriver("invalid session id".to_string()));
        }
        if self.in_broken_frame() {
            return Err(E2eError::WebDriver(
                "no such frame: frame content is unavailable".to_string(),
            ));
        }

        let frame = self.frame;
        let mut found = Vec::new();
        for live in self.elements.iter_mut().filter(|l| l.element.frame == frame) {
            if !live.element.matches(strategy)? {
                continue;
            }
            if live.element.appears_after > 0 {
                live.element.appears_after -= 1;
                continue;
            }
            found.push(FakeHandle(live.handle));
        }
        Ok(found)
    }

    fn source(&self) -> String {
        let mut html = String::from("<html><body>\n");
        html.push_str(&self.body);
        for live in &self.elements {
            let el = &live.element;
            let _ = write!(html, "<{}", el.tag);
            for (k, v) in &el.attrs {
                let _ = write!(html, " {}=\"{}\"", k, v);
            }
            let _ = writeln!(html, ">{}</{}>", el.text, el.tag);
        }
        html.push_str("</body></html>");
        html
    }
}

/// Mutable view of the page handed to click actions
pub struct ClickScope<'a> {
    state: &'a mut FakeState,
    memory: &'a Memory,
    target: Option<String>,
}

impl ClickScope<'_> {
    pub fn url(&self) -> &str {
        &self.state.url
    }

    /// Current value of the field whose id, name or test id is `key`
    pub fn field(&self, key: &str) -> Option<String> {
        self.state
            .elements
            .iter()
            .find(|l| l.element.answers_to(key))
            .map(|l| l.element.value.clone())
    }

    pub fn memory(&self) -> &Memory {
        self.memory
    }

    /// Navigate once the action returns; relative paths keep the origin
    pub fn go(&mut self, url: impl Into<String>) {
        self.target = Some(url.into());
    }

    /// Add an element to the current page
    pub fn append(&mut self, element: FakeElement) {
        self.state.push(element);
    }

    /// Remove every element answering to `key`
    pub fn remove(&mut self, key: &str) {
        self.state.elements.retain(|l| !l.element.answers_to(key));
    }

    /// Set an attribute on every element answering to `key`
    pub fn set_attr(&mut self, key: &str, name: &str, value: &str) {
        for live in self.state.elements.iter_mut().filter(|l| l.element.answers_to(key)) {
            live.element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn say(&mut self, text: &str) {
        self.state.body.push_str(text);
        self.state.body.push('\n');
    }
}

/// Handle to an element of the current fake page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeHandle(u64);

/// One session against a [`Site`]
pub struct FakeBrowser {
    site: Site,
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    /// Every strategy looked up so far, in order
    pub fn lookups(&self) -> Vec<Strategy> {
        self.state.lock().lookups.clone()
    }

    pub fn events(&self) -> Vec<FieldEvent> {
        self.state.lock().events.clone()
    }

    /// Frame the session is currently in, `None` for top-level content
    pub fn frame(&self) -> Option<usize> {
        self.state.lock().frame
    }

    /// Every frame switch, `None` marking a return to top-level content
    pub fn frame_log(&self) -> Vec<Option<usize>> {
        self.state.lock().frame_log.clone()
    }

    /// Value of the field whose id, name or test id is `key`, in any frame
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .elements
            .iter()
            .find(|l| l.element.answers_to(key))
            .map(|l| l.element.value.clone())
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn is_quit(&self) -> bool {
        self.state.lock().quit
    }

    fn ensure_open(state: &FakeState) -> E2eResult<()> {
        if state.quit {
            Err(E2eError::WebDriver("invalid session id".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeHandle;

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        let page = self.site.render(url);
        state.show(url.to_string(), page);
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(state.url.clone())
    }

    async fn page_source(&self) -> E2eResult<String> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(state.source())
    }

    async fn find(&self, strategy: &Strategy) -> E2eResult<Option<FakeHandle>> {
        Ok(self.state.lock().lookup(strategy)?.into_iter().next())
    }

    async fn find_all(&self, strategy: &Strategy) -> E2eResult<Vec<FakeHandle>> {
        self.state.lock().lookup(strategy)
    }

    async fn click(&self, element: &FakeHandle) -> E2eResult<()> {
        let mut guard = self.state.lock();
        Self::ensure_open(&guard)?;
        let target = guard.live(element)?.clone();
        if !target.displayed {
            return Err(E2eError::WebDriver(
                "element not interactable".to_string(),
            ));
        }
        let Some(action) = target.on_click else {
            return Ok(());
        };

        let state = &mut *guard;
        let mut scope = ClickScope {
            state,
            memory: self.site.memory(),
            target: None,
        };
        action(&mut scope);

        if let Some(url) = scope.target.take() {
            let url = resolve_url(&guard.url, &url);
            let page = self.site.render(&url);
            guard.show(url, page);
        }
        Ok(())
    }

    async fn clear(&self, element: &FakeHandle) -> E2eResult<()> {
        let mut state = self.state.lock();
        let el = state.live(element)?;
        if el.read_only {
            return Err(E2eError::InvalidElementState(
                "Element must be user-editable in order to clear it".to_string(),
            ));
        }
        el.value.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &FakeHandle, text: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        let el = state.live(element)?;
        if el.read_only {
            return Err(E2eError::InvalidElementState(
                "element is not reachable by keyboard".to_string(),
            ));
        }
        el.value.push_str(text);
        Ok(())
    }

    async fn attribute(&self, element: &FakeHandle, name: &str) -> E2eResult<Option<String>> {
        let mut state = self.state.lock();
        let el = state.live(element)?;
        if name == "value" {
            return Ok(Some(el.value.clone()));
        }
        Ok(el.attrs.get(name).cloned())
    }

    async fn is_displayed(&self, element: &FakeHandle) -> E2eResult<bool> {
        let mut state = self.state.lock();
        Ok(state.live(element)?.displayed)
    }

    async fn select_by_index(&self, element: &FakeHandle, index: usize) -> E2eResult<()> {
        let mut state = self.state.lock();
        let el = state.live(element)?;
        if el.tag != "select" {
            return Err(E2eError::WebDriver(format!(
                "element is a <{}>, not a <select>",
                el.tag
            )));
        }
        el.value = index.to_string();
        Ok(())
    }

    async fn execute_script(
        &self,
        script: &str,
        element: &FakeHandle,
        args: Vec<Value>,
    ) -> E2eResult<Value> {
        let mut state = self.state.lock();
        let el = state.live(element)?;
        if script != SET_VALUE_SCRIPT {
            return Ok(Value::Null);
        }
        if el.script_fails {
            return Err(E2eError::WebDriver(
                "javascript error: value assignment blocked".to_string(),
            ));
        }

        el.value = match args.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let field = el.key();
        for event in ["input", "change"] {
            state.events.push(FieldEvent {
                field: field.clone(),
                event: event.to_string(),
            });
        }
        Ok(Value::Null)
    }

    async fn enter_frame(&self, frame: &FakeHandle) -> E2eResult<()> {
        let mut state = self.state.lock();
        let el = state.live(frame)?;
        let Some(target) = el.frame_target else {
            return Err(E2eError::WebDriver("no such frame: not an iframe".to_string()));
        };
        state.frame = Some(target);
        state.frame_log.push(Some(target));
        Ok(())
    }

    async fn enter_default_frame(&self) -> E2eResult<()> {
        let mut state = self.state.lock();
        state.frame = None;
        state.frame_log.push(None);
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        let contents = {
            let state = self.state.lock();
            Self::ensure_open(&state)?;
            format!("fake screenshot of {}", state.url)
        };
        std::fs::write(path, contents)?;
        self.site.inner.stats.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn quit(&self) -> E2eResult<()> {
        self.state.lock().quit = true;
        self.site.inner.stats.lock().closed += 1;
        Ok(())
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_url(url: &str) -> (&str, Option<&str>) {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    };
    let path = match base.find("://") {
        Some(scheme_end) => {
            let rest = &base[scheme_end + 3..];
            rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
        }
        None => base,
    };
    (path, query)
}

fn resolve_url(current: &str, target: &str) -> String {
    if target.contains("://") {
        return target.to_string();
    }
    let origin = match current.find("://") {
        Some(scheme_end) => {
            let rest = &current[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            &current[..scheme_end + 3 + host_end]
        }
        None => "",
    };
    format!("{}/{}", origin, target.trim_start_matches('/'))
}

fn path_matches(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path: Vec<&str> = path.trim_matches('/').split('/').collect();
    pattern.len() == path.len()
        && pattern.iter().zip(&path).all(|(p, s)| match *p {
            "{id}" => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
            "*" => true,
            _ => p == s,
        })
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCond>,
}

#[derive(Debug)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug)]
struct AttrCond {
    name: String,
    op: AttrOp,
    value: String,
}

impl Compound {
    fn matches(&self, el: &FakeElement) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != el.tag {
                return false;
            }
        }
        let attr = |name: &str| el.attrs.get(name).map(String::as_str);
        let classes: Vec<&str> = attr("class").unwrap_or("").split_whitespace().collect();

        self.ids.iter().all(|id| attr("id") == Some(id.as_str()))
            && self.classes.iter().all(|c| classes.contains(&c.as_str()))
            && self.attrs.iter().all(|cond| {
                let Some(actual) = attr(&cond.name) else {
                    return false;
                };
                match cond.op {
                    AttrOp::Exists => true,
                    AttrOp::Equals => actual == cond.value,
                    AttrOp::Contains => actual.contains(&cond.value),
                    AttrOp::Prefix => actual.starts_with(&cond.value),
                    AttrOp::Suffix => actual.ends_with(&cond.value),
                }
            })
    }
}

/// Comma-separated list of compound selectors; combinators are unsupported
fn parse_selector(selector: &str) -> Option<Vec<Compound>> {
    selector.split(',').map(parse_compound).collect()
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut chars = input.trim().chars().peekable();
    let mut compound = Compound::default();

    let tag = take_ident(&mut chars);
    if !tag.is_empty() && tag != "*" {
        compound.tag = Some(tag.to_lowercase());
    }

    while let Some(c) = chars.next() {
        match c {
            '#' => compound.ids.push(take_ident(&mut chars)),
            '.' => compound.classes.push(take_ident(&mut chars)),
            '[' => {
                let mut body = String::new();
                let mut quote: Option<char> = None;
                loop {
                    let c = chars.next()?;
                    match quote {
                        Some(q) if c == q => quote = None,
                        Some(_) => {}
                        None if c == '\'' || c == '"' => quote = Some(c),
                        None if c == ']' => break,
                        None => {}
                    }
                    body.push(c);
                }
                compound.attrs.push(parse_attr(&body)?);
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn take_ident<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '*' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_attr(body: &str) -> Option<AttrCond> {
    let Some(eq) = body.find('=') else {
        return Some(AttrCond {
            name: body.trim().to_string(),
            op: AttrOp::Exists,
            value: String::new(),
        });
    };

    let (mut name, value) = (body[..eq].trim(), body[eq + 1..].trim());
    let op = match name.chars().last() {
        Some('*') => AttrOp::Contains,
        Some('^') => AttrOp::Prefix,
        Some('$') => AttrOp::Suffix,
        _ => AttrOp::Equals,
    };
    if !matches!(op, AttrOp::Equals) {
        name = name[..name.len() - 1].trim();
    }
    let value = value.trim_matches(|c| c == '\'' || c == '"');
    if name.is_empty() {
        return None;
    }
    Some(AttrCond {
        name: name.to_string(),
        op,
        value: value.to_string(),
    })
}
