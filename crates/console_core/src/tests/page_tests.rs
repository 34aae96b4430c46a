use super::*;
use crate::test_support::CONSOLE_URL;

#[test]
fn navigate_adds_a_history_entry_and_broadcasts() {
    let page = HeadlessPage::open(CONSOLE_URL).expect("page");
    let mut events = page.subscribe();

    page.navigate("/unauthorized");

    assert_eq!(page.location().as_str(), "http://console.test/unauthorized");
    assert_eq!(page.history().len(), 2);
    assert_eq!(
        events.try_recv().expect("event"),
        PageEvent::Navigated(page.location())
    );
}

#[test]
fn replace_rewrites_the_current_entry() {
    let page = HeadlessPage::open(CONSOLE_URL).expect("page");

    page.replace("#autoreload");
    assert_eq!(page.fragment().as_deref(), Some("autoreload"));
    assert_eq!(page.history().len(), 1);

    page.replace("/");
    assert_eq!(page.location().as_str(), CONSOLE_URL);
    assert_eq!(page.fragment(), None);
    assert_eq!(page.history().len(), 1);
}

#[test]
fn reload_keeps_location_and_resets_the_toggle() {
    let page = HeadlessPage::open("http://console.test/#autoreload").expect("page");
    let mut events = page.subscribe();
    page.set_autoreload_checked(true);

    page.reload();

    assert_eq!(page.reload_count(), 1);
    assert!(!page.autoreload_checked());
    assert_eq!(page.fragment().as_deref(), Some("autoreload"));
    assert!(matches!(events.try_recv(), Ok(PageEvent::Reloaded(_))));
}

#[test]
fn open_rejects_relative_urls() {
    let err = HeadlessPage::open("/relative").err().expect("must fail");
    assert!(matches!(err, ConsoleError::InvalidUrl { .. }));
}
