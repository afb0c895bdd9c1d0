use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use uclases_core::dom::{EventKind, HIDDEN_CLASS};
use uclases_core::{MatchItem, UnreadCountChanged};
use uclases_lookup::{LookupError, MatchSource};

use super::*;
use crate::page::{Page, UiEvent};

// ─── Fixtures ────────────────────────────────────────────────

struct NoMatches;

#[async_trait]
impl MatchSource for NoMatches {
    async fn lookup(&self, _url: &str, _query: &str) -> uclases_lookup::Result<Vec<MatchItem>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct FakeBackend {
    toggles: Mutex<VecDeque<uclases_lookup::Result<ToggleReadResponse>>>,
    mark_all: Mutex<VecDeque<uclases_lookup::Result<MarkAllReadResponse>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeBackend {
    fn toggle_reply(&self, reply: uclases_lookup::Result<ToggleReadResponse>) {
        self.toggles.lock().unwrap().push_back(reply);
    }

    fn mark_all_reply(&self, reply: uclases_lookup::Result<MarkAllReadResponse>) {
        self.mark_all.lock().unwrap().push_back(reply);
    }

    fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: &str, fields: &[(String, String)]) {
        self.calls
            .lock()
            .unwrap()
            .push((action.to_string(), fields.to_vec()));
    }
}

#[async_trait]
impl NotificationBackend for FakeBackend {
    async fn toggle_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> uclases_lookup::Result<ToggleReadResponse> {
        self.record(action, fields);
        self.toggles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LookupError::Parse("no scripted reply".to_string())))
    }

    async fn mark_all_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> uclases_lookup::Result<MarkAllReadResponse> {
        self.record(action, fields);
        self.mark_all
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LookupError::Parse("no scripted reply".to_string())))
    }
}

#[derive(Clone, Copy)]
struct Card {
    card: NodeId,
    form: NodeId,
    button: NodeId,
}

struct Fixture {
    page: Page,
    backend: Arc<FakeBackend>,
    badge: NodeId,
    mark_all_form: NodeId,
    mark_all_button: NodeId,
    cards: Vec<Card>,
    search_form: NodeId,
}

fn add_card(doc: &mut Document, parent: NodeId, id: &str) -> Card {
    let card = doc
        .build("div")
        .class(CARD_CLASS)
        .class(&UNREAD_CARD_CLASSES.join(" "))
        .append_to(parent)
        .unwrap();
    let form = doc
        .build("form")
        .class(MARK_FORM_CLASS)
        .attr("action", format!("/notifications/{id}/mark-read/"))
        .append_to(card)
        .unwrap();
    doc.build("input")
        .attr("type", "hidden")
        .attr("name", "csrfmiddlewaretoken")
        .value("tok")
        .append_to(form)
        .unwrap();
    let button = doc.build("button").text(UNREAD_LABEL).append_to(form).unwrap();
    Card { card, form, button }
}

fn fixture(policy: MarkAllPolicy) -> Fixture {
    fixture_with_cards(policy, &["7", "8"])
}

fn fixture_with_cards(policy: MarkAllPolicy, ids: &[&str]) -> Fixture {
    let mut doc = Document::new();
    let root = doc.root();
    let badge = doc
        .build("span")
        .class(BADGE_CLASS)
        .text("2")
        .append_to(root)
        .unwrap();
    let mark_all_form = doc
        .build("form")
        .attr("id", MARK_ALL_FORM_ID)
        .attr("action", "/notifications/mark-all-read/")
        .append_to(root)
        .unwrap();
    let mark_all_button = doc
        .build("button")
        .text(MARK_ALL_LABEL)
        .append_to(mark_all_form)
        .unwrap();
    doc.build("span").text("2").append_to(mark_all_button).unwrap();
    let cards = ids.iter().map(|id| add_card(&mut doc, root, id)).collect();
    let search_form = doc.build("form").attr("action", "/buscar").append_to(root).unwrap();

    let backend = Arc::new(FakeBackend::default());
    let page = Page::new(doc, Arc::new(NoMatches)).with_notifications(backend.clone(), policy);
    Fixture {
        page,
        backend,
        badge,
        mark_all_form,
        mark_all_button,
        cards,
        search_form,
    }
}

fn read_reply(is_read: bool, unread_count: u32, new_url: &str) -> ToggleReadResponse {
    ToggleReadResponse {
        success: true,
        is_read,
        new_url: Some(new_url.to_string()),
        unread_count,
        error: None,
    }
}

impl Fixture {
    fn doc(&self) -> &Document {
        self.page.document()
    }

    fn is_unread(&self, card: NodeId) -> bool {
        UNREAD_CARD_CLASSES
            .iter()
            .all(|class| self.doc().has_class(card, class))
    }
}

// ─── Single toggle ───────────────────────────────────────────

#[tokio::test]
async fn test_mark_read_patches_card_and_counts() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend
        .toggle_reply(Ok(read_reply(true, 1, "/notifications/7/mark-unread/")));
    let Card { card, form, button } = fx.cards[0];

    fx.page.dispatch(UiEvent::Submit(form));
    assert!(fx.doc().is_disabled(button));
    fx.page.settle().await;

    assert_eq!(
        fx.backend.calls(),
        vec![(
            "/notifications/7/mark-read/".to_string(),
            vec![("csrfmiddlewaretoken".to_string(), "tok".to_string())]
        )]
    );
    assert_eq!(fx.doc().attr(form, "action"), Some("/notifications/7/mark-unread/"));
    assert_eq!(fx.doc().text_content(button), READ_LABEL);
    assert!(!fx.doc().is_disabled(button));
    assert!(!fx.is_unread(card));
    assert!(fx.is_unread(fx.cards[1].card));

    assert_eq!(fx.doc().text_content(fx.badge), "1");
    assert_eq!(
        fx.doc().text_content(fx.mark_all_button),
        format!("{MARK_ALL_LABEL}1")
    );
    assert!(fx.page.document_mut().take_events().is_empty());
}

#[tokio::test]
async fn test_mark_unread_restores_unread_styling() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    let Card { card, form, button } = fx.cards[0];
    fx.page
        .document_mut()
        .remove_classes(card, &UNREAD_CARD_CLASSES)
        .unwrap();
    fx.backend
        .toggle_reply(Ok(read_reply(false, 3, "/notifications/7/mark-read/")));

    fx.page.dispatch(UiEvent::Submit(form));
    fx.page.settle().await;

    assert!(fx.is_unread(card));
    assert_eq!(fx.doc().text_content(button), UNREAD_LABEL);
    assert_eq!(fx.doc().text_content(fx.badge), "3");
}

#[tokio::test]
async fn test_rejected_toggle_alerts_server_message() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.toggle_reply(Ok(ToggleReadResponse {
        error: Some("Notificación no encontrada".to_string()),
        ..Default::default()
    }));
    let Card { card, form, button } = fx.cards[0];

    fx.page.dispatch(UiEvent::Submit(form));
    fx.page.settle().await;

    assert_eq!(fx.page.take_alerts(), vec!["Notificación no encontrada"]);
    assert!(fx.is_unread(card));
    assert!(!fx.doc().is_disabled(button));
    assert_eq!(fx.doc().attr(form, "action"), Some("/notifications/7/mark-read/"));
}

#[tokio::test]
async fn test_rejected_toggle_without_message_uses_generic_alert() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.toggle_reply(Ok(ToggleReadResponse::default()));
    fx.page.dispatch(UiEvent::Submit(fx.cards[0].form));
    fx.page.settle().await;
    assert_eq!(fx.page.take_alerts(), vec![TOGGLE_FAILED]);
}

#[tokio::test]
async fn test_transport_failure_alerts_and_reenables() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.toggle_reply(Err(LookupError::Status {
        url: "/notifications/7/mark-read/".to_string(),
        status: 500,
    }));
    let Card { form, button, .. } = fx.cards[0];

    fx.page.dispatch(UiEvent::Submit(form));
    fx.page.settle().await;

    assert_eq!(fx.page.take_alerts(), vec![TOGGLE_FAILED]);
    assert!(fx.page.take_alerts().is_empty());
    assert!(!fx.doc().is_disabled(button));
    assert_eq!(fx.doc().text_content(fx.badge), "2");
}

#[tokio::test]
async fn test_submit_while_in_flight_is_ignored() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend
        .toggle_reply(Ok(read_reply(true, 1, "/notifications/7/mark-unread/")));
    let form = fx.cards[0].form;

    fx.page.dispatch(UiEvent::Submit(form));
    fx.page.dispatch(UiEvent::Submit(form));
    fx.page.settle().await;

    assert_eq!(fx.backend.calls().len(), 1);
}

#[tokio::test]
async fn test_subscribers_receive_count_changes() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    let mut updates = fx.page.notifications().unwrap().subscribe();
    fx.backend
        .toggle_reply(Ok(read_reply(true, 1, "/notifications/7/mark-unread/")));
    fx.backend
        .toggle_reply(Ok(read_reply(true, 0, "/notifications/8/mark-unread/")));

    fx.page.dispatch(UiEvent::Submit(fx.cards[0].form));
    fx.page.settle().await;
    fx.page.dispatch(UiEvent::Submit(fx.cards[1].form));
    fx.page.settle().await;

    assert_eq!(updates.try_recv().unwrap(), UnreadCountChanged { count: 1 });
    assert_eq!(updates.try_recv().unwrap(), UnreadCountChanged { count: 0 });
    assert!(fx.doc().has_class(fx.badge, HIDDEN_CLASS));
    assert!(fx.doc().is_disabled(fx.mark_all_button));
    assert_eq!(fx.doc().text_content(fx.mark_all_button), ALL_READ_LABEL);
}

// ─── Mark all ────────────────────────────────────────────────

#[tokio::test]
async fn test_mark_all_patches_every_card() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.mark_all_reply(Ok(MarkAllReadResponse {
        success: true,
        error: None,
    }));

    fx.page.dispatch(UiEvent::Submit(fx.mark_all_form));
    assert!(fx.doc().is_disabled(fx.mark_all_button));
    assert_eq!(fx.doc().text_content(fx.mark_all_button), BUSY_LABEL);
    fx.page.settle().await;

    for (card, id) in fx.cards.iter().zip([7, 8]) {
        assert!(!fx.is_unread(card.card));
        assert_eq!(fx.doc().text_content(card.button), READ_LABEL);
        assert_eq!(
            fx.doc().attr(card.form, "action"),
            Some(format!("/notifications/{id}/mark-unread/").as_str())
        );
    }
    assert!(fx.doc().has_class(fx.badge, HIDDEN_CLASS));
    assert!(fx.doc().is_disabled(fx.mark_all_button));
    assert_eq!(fx.doc().attr(fx.mark_all_button, "title"), Some(ALL_READ_TITLE));
    assert!(!fx.page.reload_requested());
}

#[tokio::test]
async fn test_mark_all_rewrites_non_numeric_actions() {
    let mut fx = fixture_with_cards(MarkAllPolicy::Patch, &["7", "a1b2-c3"]);
    fx.backend.mark_all_reply(Ok(MarkAllReadResponse {
        success: true,
        error: None,
    }));
    let nodes = fx.doc().node_count();

    fx.page.dispatch(UiEvent::Submit(fx.mark_all_form));
    fx.page.settle().await;

    assert_eq!(
        fx.doc().attr(fx.cards[1].form, "action"),
        Some("/notifications/a1b2-c3/mark-unread/")
    );
    assert_eq!(
        fx.doc().attr(fx.cards[0].form, "action"),
        Some("/notifications/7/mark-unread/")
    );
    // the saved count pill is gone for good
    assert_eq!(fx.doc().node_count(), nodes - 1);
}

#[tokio::test]
async fn test_mark_all_with_reload_policy_requests_reload() {
    let mut fx = fixture(MarkAllPolicy::Reload);
    fx.backend.mark_all_reply(Ok(MarkAllReadResponse {
        success: true,
        error: None,
    }));

    fx.page.dispatch(UiEvent::Submit(fx.mark_all_form));
    fx.page.settle().await;

    assert!(fx.page.reload_requested());
    assert!(fx.is_unread(fx.cards[0].card));
}

#[tokio::test]
async fn test_mark_all_failure_restores_button() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.mark_all_reply(Err(LookupError::Status {
        url: "/notifications/mark-all-read/".to_string(),
        status: 502,
    }));

    let nodes = fx.doc().node_count();
    fx.page.dispatch(UiEvent::Submit(fx.mark_all_form));
    fx.page.settle().await;

    assert_eq!(fx.doc().node_count(), nodes);
    assert_eq!(fx.page.take_alerts(), vec![MARK_ALL_FAILED]);
    assert!(!fx.doc().is_disabled(fx.mark_all_button));
    assert_eq!(
        fx.doc().text_content(fx.mark_all_button),
        format!("{MARK_ALL_LABEL}2")
    );
    assert!(fx.is_unread(fx.cards[0].card));
}

#[tokio::test]
async fn test_mark_all_rejected_restores_silently() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.backend.mark_all_reply(Ok(MarkAllReadResponse {
        success: false,
        error: Some("sin permisos".to_string()),
    }));

    fx.page.dispatch(UiEvent::Submit(fx.mark_all_form));
    fx.page.settle().await;

    assert!(fx.page.take_alerts().is_empty());
    assert!(!fx.doc().is_disabled(fx.mark_all_button));
    assert_eq!(
        fx.doc().text_content(fx.mark_all_button),
        format!("{MARK_ALL_LABEL}2")
    );
}

// ─── Wiring ──────────────────────────────────────────────────

#[tokio::test]
async fn test_other_forms_submit_normally() {
    let mut fx = fixture(MarkAllPolicy::Patch);
    fx.page.dispatch(UiEvent::Submit(fx.search_form));

    let events = fx.page.document_mut().take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].target, fx.search_form);
    assert_eq!(events[0].kind, EventKind::Submit);
    assert!(!fx.page.has_pending_work());
    assert!(fx.backend.calls().is_empty());
}

#[test]
fn test_observers_only_for_present_displays() {
    let fx = fixture(MarkAllPolicy::Patch);
    assert_eq!(fx.page.notifications().unwrap().observer_count(), 2);

    let doc = Document::new();
    let toggler = NotificationToggler::attach(
        &doc,
        Arc::new(FakeBackend::default()),
        MarkAllPolicy::Patch,
    );
    assert_eq!(toggler.observer_count(), 0);
}
