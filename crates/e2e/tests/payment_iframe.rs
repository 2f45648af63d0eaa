//! Card entry across hosted payment iframes

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use localguide_e2e::fake::{FakeBrowser, FakeElement, Page, Site};
use localguide_e2e::payment::{fill_card, within_frame, TestCard};
use localguide_e2e::{Browser, E2eError, E2eResult, Strategy};

const TIMEOUT: Duration = Duration::from_millis(200);
const POLL: Duration = Duration::from_millis(10);

async fn checkout(elements: Vec<FakeElement>) -> FakeBrowser {
    let page = elements.into_iter().fold(Page::new(), Page::with);
    let site = Site::new().page("/pay", move |_| page.clone());
    let browser = site.browser();
    browser.navigate("http://localguide.test/pay").await.unwrap();
    browser
}

/// One hosted iframe per field, the way split card elements render
fn split_fields() -> Vec<FakeElement> {
    vec![
        FakeElement::iframe(0),
        FakeElement::iframe(1),
        FakeElement::iframe(2),
        FakeElement::new("input")
            .name("cardnumber")
            .attr("aria-label", "Credit or debit card number")
            .in_frame(0),
        FakeElement::new("input")
            .name("exp-date")
            .attr("placeholder", "MM / YY")
            .in_frame(1),
        FakeElement::new("input")
            .name("cvc")
            .attr("aria-label", "Credit or debit card CVC/CVV")
            .in_frame(2),
    ]
}

/// All three fields inside one iframe
fn single_frame() -> Vec<FakeElement> {
    vec![
        FakeElement::iframe(0),
        FakeElement::new("input")
            .name("cardnumber")
            .attr("aria-label", "Credit or debit card number")
            .in_frame(0),
        FakeElement::new("input")
            .name("exp-date")
            .attr("aria-label", "Credit or debit card expiration date")
            .in_frame(0),
        FakeElement::new("input")
            .name("cvc")
            .attr("placeholder", "CVC")
            .attr("aria-label", "Credit or debit card CVC/CVV")
            .in_frame(0),
    ]
}

async fn first_frame(browser: &FakeBrowser) -> <FakeBrowser as Browser>::Element {
    browser.find(&Strategy::css("iframe")).await.unwrap().unwrap()
}

async fn explode(_: &FakeBrowser) -> E2eResult<bool> {
    panic!("frame body exploded")
}

async fn refuse(_: &FakeBrowser) -> E2eResult<bool> {
    Err(E2eError::assertion("nothing in this frame"))
}

#[tokio::test]
async fn test_card_typed_into_single_frame() {
    let browser = checkout(single_frame()).await;

    assert!(fill_card(&browser, &TestCard::default(), TIMEOUT, POLL).await.unwrap());
    assert_eq!(browser.value_of("cardnumber").as_deref(), Some("4242424242424242"));
    assert_eq!(browser.value_of("exp-date").as_deref(), Some("1234"));
    assert_eq!(browser.value_of("cvc").as_deref(), Some("123"));
    assert_eq!(browser.frame(), None);
}

/// Only the frame holding the number is filled; the others are left alone
#[tokio::test]
async fn test_split_fields_fill_number_frame() {
    let browser = checkout(split_fields()).await;

    assert!(fill_card(&browser, &TestCard::default(), TIMEOUT, POLL).await.unwrap());
    assert_eq!(browser.value_of("cardnumber").as_deref(), Some("4242424242424242"));
    assert_eq!(browser.frame_log(), vec![Some(0), None]);
    assert_eq!(browser.frame(), None);
}

/// An unreadable frame is skipped and the scan continues
#[tokio::test]
async fn test_broken_frame_is_skipped() {
    let mut elements = vec![FakeElement::iframe(5).broken()];
    elements.extend(single_frame());
    let browser = checkout(elements).await;

    assert!(fill_card(&browser, &TestCard::default(), TIMEOUT, POLL).await.unwrap());
    assert_eq!(browser.frame_log(), vec![Some(5), None, Some(0), None]);
    assert_eq!(browser.value_of("cvc").as_deref(), Some("123"));
}

#[tokio::test]
async fn test_no_iframe_gives_up_after_timeout() {
    let browser = checkout(vec![FakeElement::input("cardnumber")]).await;

    assert!(!fill_card(&browser, &TestCard::default(), TIMEOUT, POLL).await.unwrap());
    assert!(browser.frame_log().is_empty());
    assert_eq!(browser.value_of("cardnumber").as_deref(), Some(""));
}

#[tokio::test]
async fn test_frames_without_card_number() {
    let browser = checkout(vec![
        FakeElement::iframe(0),
        FakeElement::new("input").name("postal").in_frame(0),
    ])
    .await;

    assert!(!fill_card(&browser, &TestCard::default(), TIMEOUT, POLL).await.unwrap());
    assert_eq!(browser.frame(), None);
}

/// Top-level content is restored when the body fails
#[tokio::test]
async fn test_within_frame_restores_after_error() {
    let browser = checkout(single_frame()).await;
    let frame = first_frame(&browser).await;

    let result = within_frame(&browser, &frame, refuse).await;
    assert!(matches!(result, Err(E2eError::AssertionFailed(_))));
    assert_eq!(browser.frame(), None);
    assert_eq!(browser.frame_log(), vec![Some(0), None]);
}

/// Top-level content is restored before a panic carries on
#[tokio::test]
async fn test_within_frame_restores_after_panic() {
    let browser = checkout(single_frame()).await;
    let frame = first_frame(&browser).await;

    let outcome = AssertUnwindSafe(within_frame(&browser, &frame, explode))
        .catch_unwind()
        .await;
    assert!(outcome.is_err());
    assert_eq!(browser.frame(), None);
    assert_eq!(browser.frame_log(), vec![Some(0), None]);
}

/// Frame contents are only visible from inside the frame
#[tokio::test]
async fn test_lookups_are_scoped_to_current_frame() {
    let browser = checkout(single_frame()).await;
    let frame = first_frame(&browser).await;

    assert!(browser.find(&Strategy::name("cardnumber")).await.unwrap().is_none());
    let inside = within_frame(&browser, &frame, |b| async move {
        Ok(b.find(&Strategy::name("cardnumber")).await?.is_some())
    })
    .await
    .unwrap();
    assert!(inside);
}
