//! Smoke test against a real browser
//!
//! Needs chromedriver (or WEBDRIVER_URL) and a browser:
//! cargo test --package localguide-e2e --test live_webdriver -- --ignored

use chrono::NaiveDate;

use localguide_e2e::input::{set_date, set_value, InputOutcome};
use localguide_e2e::{Browser, E2eError, Launcher, Locator, Resolver, Strategy, SuiteConfig, WebDriverLauncher};

const FORM: &str = "data:text/html;charset=utf-8,\
<input%20id='email'>\
<input%20id='start_date'%20type='date'%20readonly>\
<button%20type='submit'>เข้าสู่ระบบ</button>";

#[tokio::test]
#[ignore]
async fn test_live_session_resolves_and_fills() {
    let config = SuiteConfig {
        headless: true,
        ..SuiteConfig::from_env().unwrap()
    };
    let mut launcher = match WebDriverLauncher::start(config.clone()).await {
        Ok(launcher) => launcher,
        Err(E2eError::DriverNotFound(binary)) => {
            eprintln!("{} not installed, skipping", binary);
            return;
        }
        Err(e) => panic!("driver did not start: {}", e),
    };

    let browser = launcher.launch().await.unwrap();
    browser.navigate(FORM).await.unwrap();
    let resolver = Resolver::from_timeouts(&config.timeouts);

    let email = resolver
        .require(&browser, &Locator::new("email").or_await(Strategy::id("email")))
        .await
        .unwrap();
    assert_eq!(set_value(&browser, &email, "user1@gmail.com").await, InputOutcome::Typed);
    assert_eq!(
        browser.attribute(&email, "value").await.unwrap().as_deref(),
        Some("user1@gmail.com")
    );

    let date = browser.find(&Strategy::id("start_date")).await.unwrap().unwrap();
    let outcome = set_date(&browser, &date, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()).await;
    assert!(outcome.is_set(), "{:?}", outcome);

    let submit = Locator::clickable("submit", &["เข้าสู่ระบบ"]);
    assert!(resolver.resolve(&browser, &submit).await.is_found());

    browser.quit().await.unwrap();
    launcher.stop().unwrap();
}
