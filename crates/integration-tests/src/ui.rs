//! A `CartUi` that records every call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_cart_client::{CartUi, Control, Notification, NotificationKind};
use storefront_cart_core::{CartItemId, CartSnapshot};

/// One call the client made into the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ControlEnabled(Control, bool),
    Notified(Notification),
    Confirmed { prompt: String, answer: bool },
    CountSet(u32),
    RowRemoved(CartItemId),
    Rendered(CartSnapshot),
}

#[derive(Default)]
struct Log {
    events: Vec<UiEvent>,
    answers: VecDeque<bool>,
    default_answer: bool,
}

/// Records UI calls and answers confirmations.
///
/// Clones share the same log, so a test can keep one handle while the client
/// owns another.
#[derive(Clone, Default)]
pub struct RecordingUi {
    log: Arc<Mutex<Log>>,
}

impl RecordingUi {
    /// A UI that accepts every confirmation.
    #[must_use]
    pub fn confirming() -> Self {
        let ui = Self::default();
        ui.lock().default_answer = true;
        ui
    }

    /// A UI that declines every confirmation.
    #[must_use]
    pub fn declining() -> Self {
        Self::default()
    }

    /// Queue answers for the next confirmations, before falling back to the default.
    pub fn answer_next(&self, answers: &[bool]) {
        self.lock().answers.extend(answers);
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: UiEvent) {
        self.lock().events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        self.lock().events.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Notified(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message)
            .collect()
    }

    #[must_use]
    pub fn last_notification(&self) -> Option<Notification> {
        self.notifications().pop()
    }

    /// Most recent badge value.
    #[must_use]
    pub fn last_count(&self) -> Option<u32> {
        self.lock().events.iter().rev().find_map(|event| match event {
            UiEvent::CountSet(count) => Some(*count),
            _ => None,
        })
    }

    /// Every badge value, in order.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                UiEvent::CountSet(count) => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Most recent rendered snapshot.
    #[must_use]
    pub fn last_render(&self) -> Option<CartSnapshot> {
        self.lock().events.iter().rev().find_map(|event| match event {
            UiEvent::Rendered(snapshot) => Some(snapshot.clone()),
            _ => None,
        })
    }

    /// The enabled/disabled transitions of one control, in order.
    #[must_use]
    pub fn control_states(&self, control: Control) -> Vec<bool> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                UiEvent::ControlEnabled(c, enabled) if *c == control => Some(*enabled),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Confirmed { prompt, .. } => Some(prompt.clone()),
                _ => None,
            })
            .collect()
    }
}

impl CartUi for RecordingUi {
    fn set_control_enabled(&self, control: Control, enabled: bool) {
        self.push(UiEvent::ControlEnabled(control, enabled));
    }

    fn notify(&self, notification: Notification) {
        self.push(UiEvent::Notified(notification));
    }

    async fn confirm(&self, prompt: &str) -> bool {
        let mut log = self.lock();
        let answer = log.answers.pop_front().unwrap_or(log.default_answer);
        log.events.push(UiEvent::Confirmed {
            prompt: prompt.to_string(),
            answer,
        });
        answer
    }

    fn set_count(&self, count: u32) {
        self.push(UiEvent::CountSet(count));
    }

    fn remove_row(&self, item_id: CartItemId) {
        self.push(UiEvent::RowRemoved(item_id));
    }

    fn render_items(&self, snapshot: &CartSnapshot) {
        self.push(UiEvent::Rendered(snapshot.clone()));
    }
}
