//! Scripted LocalGuide application for flow and runner tests
//!
//! Backend memory keys:
//! - `session`: email of the last successful login
//! - `requires`, `offers`, `bookings`: id counters
//! - `require:<id>:<field>`, `offer:<id>:price`, `require:<id>:offer`
//! - `booking:<id>:status` plus report and dispute details

#![allow(dead_code)]

use std::time::Duration;

use localguide_e2e::config::Timeouts;
use localguide_e2e::fake::{ClickScope, FakeElement, Memory, Page, Request, Site};
use localguide_e2e::flows::trip_require::{self, TripRequireDraft};
use localguide_e2e::{Fixtures, FlowState, Session, SuiteConfig};

pub const BASE_URL: &str = "http://localguide.test";

pub const LOGIN_ERROR: &str = "อีเมลหรือรหัสผ่านไม่ถูกต้อง";

/// Short waits so misses fail fast
pub fn fast_config() -> SuiteConfig {
    SuiteConfig {
        base_url: BASE_URL.to_string(),
        timeouts: Timeouts {
            implicit: Duration::ZERO,
            explicit: Duration::from_millis(300),
            page_load: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            settle: Duration::ZERO,
            modal_window: Duration::from_millis(100),
        },
        screenshot_on_failure: false,
        ..SuiteConfig::default()
    }
}

pub fn count(memory: &Memory, key: &str) -> u64 {
    memory.recall(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Booking with `status`, as if created by an earlier run
pub fn seed_booking(site: &Site, status: &str) -> u64 {
    let id = site.memory().next_id("bookings");
    site.memory().remember(&format!("booking:{}:status", id), status);
    id
}

pub fn booking_status(site: &Site, id: u64) -> Option<String> {
    site.memory().recall(&format!("booking:{}:status", id))
}

/// Create a trip request through the UI as the seeded traveller
pub async fn create_require(site: &Site, config: &SuiteConfig, state: &mut FlowState) {
    let browser = site.browser();
    let session = Session::new(&browser, config);
    let draft = TripRequireDraft::sample_today();
    trip_require::create_trip_require(&session, &Fixtures::default().user, &draft, state)
        .await
        .unwrap();
}

/// The LocalGuide pages the suite touches, backed by the site's memory
pub fn localguide_site() -> Site {
    let fixtures = Fixtures::default();
    let accounts: Vec<(String, String)> = [fixtures.user, fixtures.guide, fixtures.admin]
        .into_iter()
        .map(|u| (u.email, u.password))
        .collect();

    Site::new()
        .page("/auth/login", move |_| login_page(accounts.clone()))
        .page("/auth/register", register_page)
        .page("/dashboard", |_| {
            Page::new()
                .body("แดชบอร์ด")
                .with(FakeElement::button("ออกจากระบบ").on_click(|scope| scope.go("/auth/login")))
        })
        .page("/user/trip-requires/create", require_form)
        .page("/user/trip-requires", require_list)
        .page("/user/trip-requires/{id}/offers", offers_page)
        .page("/guide/trip-offers/create", offer_form)
        .page("/guide/trip-offers/{id}", |_| Page::new().body("ข้อเสนอของคุณ"))
        .page("/trip-bookings", bookings_list)
        .page("/trip-bookings/{id}", booking_page)
        .page("/trip-bookings/{id}/payment", payment_page)
}

pub fn error_banner(text: &str) -> FakeElement {
    FakeElement::new("div").class("text-red-700").text(text)
}

fn login_page(accounts: Vec<(String, String)>) -> Page {
    Page::new()
        .body("เข้าสู่ระบบ")
        .with(FakeElement::input("email").kind("email"))
        .with(FakeElement::input("password").kind("password"))
        .with(
            FakeElement::button("แสดงรหัสผ่าน")
                .kind("button")
                .on_click(|scope| scope.set_attr("password", "type", "text")),
        )
        .with(
            FakeElement::button("เข้าสู่ระบบ")
                .kind("submit")
                .on_click(move |scope| {
                    let email = scope.field("email").unwrap_or_default();
                    let password = scope.field("password").unwrap_or_default();
                    if accounts.iter().any(|(e, p)| *e == email && *p == password) {
                        scope.memory().remember("session", email);
                        scope.go("/dashboard");
                    } else {
                        scope.append(error_banner(LOGIN_ERROR));
                    }
                }),
        )
}

fn register_page(_: &Request<'_>) -> Page {
    Page::new()
        .body("สมัครสมาชิก")
        .with(FakeElement::input("email").kind("email"))
        .with(FakeElement::input("password").kind("password"))
        .with(FakeElement::input("confirmPassword").kind("password"))
        .with(FakeElement::input("firstName"))
        .with(FakeElement::input("lastName"))
        .with(
            FakeElement::button("สมัครสมาชิก")
                .kind("submit")
                .on_click(|scope| {
                    let email = scope.field("email").unwrap_or_default();
                    scope.memory().remember("registered", email);
                    scope.go("/auth/login");
                }),
        )
}

fn require_input(test_id: &str, name: &str) -> FakeElement {
    FakeElement::new("input").test_id(test_id).name(name)
}

fn require_form(_: &Request<'_>) -> Page {
    Page::new()
        .body("สร้างความต้องการทริป")
        .with(require_input("trip-require-title", "title"))
        .with(FakeElement::textarea("description").test_id("trip-require-description"))
        .with(FakeElement::select("province_id").test_id("trip-require-province"))
        .with(require_input("trip-require-start-date", "start_date").kind("date"))
        .with(
            require_input("trip-require-end-date", "end_date")
                .kind("date")
                .read_only(),
        )
        .with(require_input("trip-require-days", "days").kind("number"))
        .with(require_input("trip-require-group-size", "group_size").kind("number"))
        .with(require_input("trip-require-min-price", "min_price").kind("number"))
        .with(require_input("trip-require-max-price", "max_price").kind("number"))
        .with(FakeElement::textarea("requirements").test_id("trip-require-requirements"))
        .with(
            FakeElement::button("สร้างความต้องการ")
                .kind("submit")
                .test_id("trip-require-submit")
                .on_click(save_require),
        )
}

fn save_require(scope: &mut ClickScope<'_>) {
    let title = scope.field("title").unwrap_or_default();
    if title.trim().is_empty() {
        scope.append(error_banner("กรุณากรอกชื่อทริป"));
        return;
    }
    let fields: Vec<(&str, String)> = [
        "start_date",
        "end_date",
        "province_id",
        "days",
        "group_size",
        "min_price",
        "max_price",
    ]
    .into_iter()
    .map(|name| (name, scope.field(name).unwrap_or_default()))
    .collect();

    let memory = scope.memory();
    let id = memory.next_id("requires");
    memory.remember(&format!("require:{}:title", id), title);
    for (name, value) in fields {
        memory.remember(&format!("require:{}:{}", id, name), value);
    }
    scope.go("/user/trip-requires");
}

fn require_list(req: &Request<'_>) -> Page {
    let mut page = Page::new().body("ความต้องการทริปของฉัน");
    for id in 1..=count(req.memory, "requires") {
        let title = req
            .memory
            .recall(&format!("require:{}:title", id))
            .unwrap_or_default();
        page = page
            .with(FakeElement::link("ดูข้อเสนอ", &format!("/user/trip-requires/{}/offers", id)))
            .with(FakeElement::link(&title, &format!("/user/trip-requires/{}", id)));
    }
    page
}

fn offers_page(req: &Request<'_>) -> Page {
    let Some(require_id) = req.id() else {
        return Page::new().body("404 Not Found");
    };
    let mut page = Page::new().body("ข้อเสนอที่ได้รับ");
    if let Some(offer) = req.memory.recall(&format!("require:{}:offer", require_id)) {
        let price = req
            .memory
            .recall(&format!("offer:{}:price", offer))
            .unwrap_or_default();
        page = page
            .with(
                FakeElement::new("div")
                    .class("offer-card")
                    .text(&format!("ข้อเสนอ #{} ราคา {}", offer, price)),
            )
            .with(FakeElement::button("ยอมรับข้อเสนอ").on_click(|scope| {
                scope.append(FakeElement::button("ยืนยัน").on_click(|scope| {
                    let memory = scope.memory();
                    let booking = memory.next_id("bookings");
                    memory.remember(&format!("booking:{}:status", booking), "pending_payment");
                    scope.go(format!("/trip-bookings/{}", booking));
                }));
            }));
    }
    page
}

fn offer_form(req: &Request<'_>) -> Page {
    let require_id = req
        .query_param("trip_require_id")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|id| req.memory.recall(&format!("require:{}:title", id)).is_some());
    let Some(require_id) = require_id else {
        return Page::new().body("ไม่พบข้อมูลความต้องการทริป");
    };

    Page::new()
        .body("สร้างข้อเสนอ")
        .with(FakeElement::new("input").name("title"))
        .with(FakeElement::textarea("description"))
        .with(FakeElement::new("input").name("totalPrice").kind("number"))
        .with(FakeElement::textarea("itinerary"))
        .with(FakeElement::textarea("included_services"))
        .with(
            FakeElement::button("ส่งข้อเสนอ")
                .kind("submit")
                .on_click(move |scope| {
                    let price: u64 = scope
                        .field("totalPrice")
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                    let bound = |field: &str| {
                        count(scope.memory(), &format!("require:{}:{}", require_id, field))
                    };
                    let (min, max) = (bound("min_price"), bound("max_price"));
                    if price < min || price > max {
                        scope.append(error_banner("ราคาต้องอยู่ในงบประมาณของลูกค้า"));
                        return;
                    }
                    let memory = scope.memory();
                    let offer = memory.next_id("offers");
                    memory.remember(&format!("offer:{}:price", offer), price.to_string());
                    memory.remember(&format!("require:{}:offer", require_id), offer.to_string());
                    scope.go(format!("/guide/trip-offers/{}", offer));
                }),
        )
}

fn bookings_list(req: &Request<'_>) -> Page {
    let mut page = Page::new().body("การจองของฉัน");
    for id in 1..=count(req.memory, "bookings") {
        let status = req
            .memory
            .recall(&format!("booking:{}:status", id))
            .unwrap_or_default();
        page = page
            .body(&format!("#{} {}", id, status))
            .with(FakeElement::link("ชำระเงิน", &format!("/trip-bookings/{}/payment", id)))
            .with(FakeElement::link(&format!("การจอง #{}", id), &format!("/trip-bookings/{}", id)));
    }
    page
}

fn booking_page(req: &Request<'_>) -> Page {
    let Some(id) = req.id() else {
        return Page::new().body("404 Not Found");
    };
    let Some(status) = req.memory.recall(&format!("booking:{}:status", id)) else {
        return Page::new().body("ไม่พบการจอง");
    };

    let page = Page::new()
        .body(&format!("การจอง #{}", id))
        .body(&format!("สถานะ: {}", status));
    match status.as_str() {
        "pending_payment" => page.with(
            FakeElement::button("ชำระเงิน")
                .on_click(move |scope| scope.go(format!("/trip-bookings/{}/payment", id))),
        ),
        "paid" => page
            .with(confirm_step(id, "confirm-guide-arrival-button", "ยืนยันไกด์มาถึงแล้ว", "trip_started"))
            .with(report_button(id, "report-user-no-show-button", "รายงานว่าลูกค้าไม่มา"))
            .with(report_button(id, "report-guide-no-show-button", "รายงานว่าไกด์ไม่มา")),
        "trip_started" => page.with(confirm_step(
            id,
            "confirm-trip-complete-button",
            "ยืนยันทริปเสร็จสิ้น",
            "trip_completed",
        )),
        "no_show_reported" => page.with(dispute_button(id)),
        _ => page,
    }
}

/// A button that opens a confirmation dialog which moves the booking on.
/// The button itself stays on the page while the dialog is open.
fn confirm_step(id: u64, test_id: &'static str, text: &str, next: &'static str) -> FakeElement {
    FakeElement::button(text).test_id(test_id).on_click(move |scope| {
        scope.memory().next_id(&format!("booking:{}:{}:clicks", id, test_id));
        scope.append(FakeElement::button("ยืนยัน").in_dialog().on_click(move |scope| {
            scope
                .memory()
                .remember(&format!("booking:{}:status", id), next);
            scope.go(format!("/trip-bookings/{}", id));
        }));
    })
}

fn report_button(id: u64, test_id: &'static str, text: &str) -> FakeElement {
    FakeElement::button(text).test_id(test_id).on_click(move |scope| {
        scope.remove("report-user-no-show-button");
        scope.remove("report-guide-no-show-button");
        scope.append(
            FakeElement::textarea("reason")
                .test_id("no-show-reason-textarea")
                .appears_after(1),
        );
        scope.append(
            FakeElement::button("ส่งรายงาน")
                .test_id("no-show-submit-button")
                .on_click(move |scope| {
                    let reason = scope.field("no-show-reason-textarea").unwrap_or_default();
                    let memory = scope.memory();
                    memory.remember(&format!("booking:{}:status", id), "no_show_reported");
                    memory.remember(&format!("booking:{}:no_show_reason", id), reason);
                    memory.remember(&format!("booking:{}:reported_by", id), test_id);
                    scope.go(format!("/trip-bookings/{}", id));
                }),
        );
    })
}

fn dispute_button(id: u64) -> FakeElement {
    FakeElement::button("โต้แย้งการรีพอร์ต")
        .test_id("dispute-no-show-button")
        .on_click(move |scope| {
            scope.remove("dispute-no-show-button");
            scope.append(
                FakeElement::new("input")
                    .kind("text")
                    .test_id("dispute-reason-input"),
            );
            scope.append(FakeElement::textarea("description").test_id("dispute-description-textarea"));
            scope.append(
                FakeElement::button("ส่งโต้แย้ง")
                    .test_id("dispute-submit-button")
                    .on_click(move |scope| {
                        let reason = scope.field("dispute-reason-input").unwrap_or_default();
                        let description = scope
                            .field("dispute-description-textarea")
                            .unwrap_or_default();
                        let memory = scope.memory();
                        memory.remember(&format!("booking:{}:status", id), "no_show_disputed");
                        memory.remember(&format!("booking:{}:dispute_reason", id), reason);
                        memory.remember(&format!("booking:{}:dispute_description", id), description);
                        scope.go(format!("/trip-bookings/{}", id));
                    }),
            );
        })
}

fn card_input(name: &str) -> FakeElement {
    FakeElement::new("input").name(name).in_frame(0)
}

fn payment_page(req: &Request<'_>) -> Page {
    let Some(id) = req.id() else {
        return Page::new().body("404 Not Found");
    };

    Page::new()
        .body(&format!("ชำระเงินสำหรับการจอง #{}", id))
        .with(FakeElement::iframe(1).broken())
        .with(FakeElement::iframe(0))
        .with(
            card_input("cardnumber")
                .attr("aria-label", "Credit or debit card number")
                .attr("placeholder", "1234 1234 1234 1234"),
        )
        .with(
            card_input("exp-date")
                .attr("aria-label", "Credit or debit card expiration date")
                .attr("placeholder", "MM / YY"),
        )
        .with(
            card_input("cvc")
                .attr("aria-label", "Credit or debit card CVC/CVV")
                .attr("placeholder", "CVC"),
        )
        .with(
            FakeElement::button("ชำระเงิน")
                .test_id("payment-submit-button")
                .on_click(move |scope| {
                    let number = scope.field("cardnumber").unwrap_or_default();
                    if number != "4242424242424242" {
                        scope.append(error_banner("บัตรถูกปฏิเสธ"));
                        return;
                    }
                    let expiry = scope.field("exp-date").unwrap_or_default();
                    let memory = scope.memory();
                    memory.remember(&format!("booking:{}:status", id), "paid");
                    memory.remember(&format!("booking:{}:card_expiry", id), expiry);
                    scope.go(format!("/trip-bookings/{}", id));
                }),
        )
}
