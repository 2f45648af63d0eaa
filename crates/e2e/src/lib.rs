//! LocalGuide E2E Test Suite
//!
//! This crate drives the LocalGuide web application through a real browser
//! to validate the trip-booking workflow end to end:
//! - Spawns `chromedriver`/`geckodriver` unless a WebDriver URL is given
//! - Resolves elements through ordered locator strategies
//! - Fills inputs with a scripted fallback and pays through the card iframe
//! - Threads typed flow state from one case to the next within a group
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner<L: Launcher>                                    │
//! │    ├── launch() -> Browser            (one per case)        │
//! │    ├── Case::run(session, fixtures, &mut FlowState)         │
//! │    ├── capture_failure() -> ScreenshotRecord                │
//! │    └── quit()                         (always)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  flows                                                      │
//! │    ├── auth          login, register, logout                │
//! │    ├── trip_require  user creates a trip request            │
//! │    ├── trip_offer    guide offers against it                │
//! │    ├── booking       accept, pay, confirm arrival/complete  │
//! │    └── no_show       report and dispute                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session: Resolver(Locator) · input setter · within_frame   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Browser trait                                              │
//! │    ├── WebDriverBrowser (thirtyfour)                        │
//! │    └── FakeBrowser      (scripted pages, for tests)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod fake;
pub mod fixtures;
pub mod flows;
pub mod input;
pub mod locator;
pub mod payment;
pub mod runner;
pub mod screenshot;
pub mod state;
pub mod suite;
pub mod wait;

pub use config::SuiteConfig;
pub use driver::webdriver::{WebDriverBrowser, WebDriverLauncher};
pub use driver::{Browser, Launcher, Strategy};
pub use error::{E2eError, E2eResult};
pub use fixtures::{Fixtures, Role, TestUser};
pub use flows::{Session, StepOutcome};
pub use locator::{Locator, Resolution, Resolver};
pub use runner::{TestResult, TestRunner, TestStatus, TestSuiteResult};
pub use state::{FlowStage, FlowState};
pub use suite::{Case, Group};
