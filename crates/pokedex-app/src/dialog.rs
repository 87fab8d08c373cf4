// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Modal dialogs as single-result awaitables.
//!
//! A request returns a [`Pending`] handle immediately; the UI later settles
//! the active dialog through the controller. At most one dialog is active at
//! a time. Requests made while a dialog is open wait in FIFO order and become
//! active as earlier dialogs settle.

use futures::channel::oneshot;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::ids::DialogId;

/// Maps a candidate input to an inline error message, or `None` when valid.
pub type Validator = Box<dyn Fn(&str) -> Option<String>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogTone {
    #[default]
    Info,
    Warning,
    Error,
    Success,
    Celebration,
}

impl DialogTone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Celebration => "celebration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmParams {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub tone: DialogTone,
}

impl ConfirmParams {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirm".to_owned(),
            cancel_label: "Cancel".to_owned(),
            tone: DialogTone::Info,
        }
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    pub fn tone(mut self, tone: DialogTone) -> Self {
        self.tone = tone;
        self
    }
}

pub struct TextInputParams {
    pub title: String,
    pub message: String,
    pub placeholder: String,
    pub default_value: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub validate: Option<Validator>,
}

impl TextInputParams {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            placeholder: String::new(),
            default_value: String::new(),
            confirm_label: "Confirm".to_owned(),
            cancel_label: "Cancel".to_owned(),
            validate: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    fn check(&self, candidate: &str) -> Option<String> {
        self.validate
            .as_ref()
            .and_then(|validate| validate(candidate))
            .filter(|message| !message.is_empty())
    }
}

impl fmt::Debug for TextInputParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextInputParams")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("placeholder", &self.placeholder)
            .field("default_value", &self.default_value)
            .field("confirm_label", &self.confirm_label)
            .field("cancel_label", &self.cancel_label)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

/// The value a dialog resolves to when it is cancelled, dismissed, or torn
/// down without an answer.
pub trait Dismissal {
    fn dismissed() -> Self;
}

impl Dismissal for bool {
    fn dismissed() -> Self {
        false
    }
}

impl Dismissal for Option<String> {
    fn dismissed() -> Self {
        None
    }
}

/// Handle to one dialog request. Yields exactly one value, either by
/// awaiting it or by polling [`Pending::try_settled`] from an event loop.
#[derive(Debug)]
pub struct Pending<T> {
    id: DialogId,
    receiver: oneshot::Receiver<T>,
    taken: bool,
}

impl<T: Dismissal> Pending<T> {
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// `Some` exactly once, after the dialog settles. A resolver that was
    /// dropped unsettled counts as a dismissal.
    pub fn try_settled(&mut self) -> Option<T> {
        if self.taken {
            return None;
        }
        let value = match self.receiver.try_recv() {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(oneshot::Canceled) => T::dismissed(),
        };
        self.taken = true;
        Some(value)
    }
}

impl<T: Dismissal> Future for Pending<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| T::dismissed()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Confirmation,
    TextInput,
}

/// Read-only projection of the active dialog for rendering.
#[derive(Debug, Clone, Copy)]
pub enum DialogView<'a> {
    Confirmation {
        id: DialogId,
        params: &'a ConfirmParams,
    },
    TextInput {
        id: DialogId,
        params: &'a TextInputParams,
        value: &'a str,
        error: Option<&'a str>,
    },
}

impl DialogView<'_> {
    pub fn kind(&self) -> DialogKind {
        match self {
            Self::Confirmation { .. } => DialogKind::Confirmation,
            Self::TextInput { .. } => DialogKind::TextInput,
        }
    }

    pub fn id(&self) -> DialogId {
        match self {
            Self::Confirmation { id, .. } | Self::TextInput { id, .. } => *id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Confirmation { params, .. } => &params.title,
            Self::TextInput { params, .. } => &params.title,
        }
    }
}

#[derive(Debug)]
enum DialogBody {
    Confirmation {
        params: ConfirmParams,
        resolver: oneshot::Sender<bool>,
    },
    TextInput {
        params: TextInputParams,
        value: String,
        error: Option<String>,
        resolver: oneshot::Sender<Option<String>>,
    },
}

#[derive(Debug)]
struct OpenDialog {
    id: DialogId,
    body: DialogBody,
}

impl OpenDialog {
    fn kind(&self) -> DialogKind {
        match self.body {
            DialogBody::Confirmation { .. } => DialogKind::Confirmation,
            DialogBody::TextInput { .. } => DialogKind::TextInput,
        }
    }

    fn accept(self, text: Option<String>) {
        let id = self.id;
        let delivered = match self.body {
            DialogBody::Confirmation { resolver, .. } => resolver.send(true).is_ok(),
            DialogBody::TextInput { resolver, .. } => resolver.send(text).is_ok(),
        };
        log_settlement(id, "accepted", delivered);
    }

    fn dismiss(self) {
        let id = self.id;
        let delivered = match self.body {
            DialogBody::Confirmation { resolver, .. } => resolver.send(false).is_ok(),
            DialogBody::TextInput { resolver, .. } => resolver.send(None).is_ok(),
        };
        log_settlement(id, "dismissed", delivered);
    }
}

fn log_settlement(id: DialogId, outcome: &'static str, delivered: bool) {
    if delivered {
        tracing::debug!(dialog_id = %id, outcome, "dialog settled");
    } else {
        tracing::debug!(dialog_id = %id, outcome, "dialog settled after its handle was dropped");
    }
}

#[derive(Debug, Default)]
pub struct DialogController {
    active: Option<OpenDialog>,
    queue: VecDeque<OpenDialog>,
    next_id: i64,
}

impl DialogController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_confirmation(&mut self, params: ConfirmParams) -> Pending<bool> {
        let (resolver, receiver) = oneshot::channel();
        let id = self.allocate_id();
        tracing::debug!(dialog_id = %id, tone = params.tone.as_str(), title = %params.title, "confirmation requested");
        self.open(OpenDialog {
            id,
            body: DialogBody::Confirmation { params, resolver },
        });
        Pending {
            id,
            receiver,
            taken: false,
        }
    }

    pub fn request_text_input(&mut self, params: TextInputParams) -> Pending<Option<String>> {
        let (resolver, receiver) = oneshot::channel();
        let id = self.allocate_id();
        tracing::debug!(dialog_id = %id, title = %params.title, "text input requested");
        let value = params.default_value.clone();
        self.open(OpenDialog {
            id,
            body: DialogBody::TextInput {
                params,
                value,
                error: None,
                resolver,
            },
        });
        Pending {
            id,
            receiver,
            taken: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn active(&self) -> Option<DialogView<'_>> {
        let dialog = self.active.as_ref()?;
        Some(match &dialog.body {
            DialogBody::Confirmation { params, .. } => DialogView::Confirmation {
                id: dialog.id,
                params,
            },
            DialogBody::TextInput {
                params,
                value,
                error,
                ..
            } => DialogView::TextInput {
                id: dialog.id,
                params,
                value,
                error: error.as_deref(),
            },
        })
    }

    /// Activates the confirm action of an open confirmation.
    pub fn confirm(&mut self) -> bool {
        match self.active.as_ref().map(OpenDialog::kind) {
            Some(DialogKind::Confirmation) => self.settle_active(|dialog| dialog.accept(None)),
            _ => false,
        }
    }

    /// Submits the open text input. An invalid candidate keeps the dialog
    /// open with the error shown inline.
    pub fn submit(&mut self) -> bool {
        let Some(OpenDialog {
            body:
                DialogBody::TextInput {
                    params,
                    value,
                    error,
                    ..
                },
            ..
        }) = self.active.as_mut()
        else {
            return false;
        };

        if let Some(message) = params.check(value) {
            tracing::debug!(error = %message, "text input rejected");
            *error = Some(message);
            return false;
        }

        let submitted = value.trim().to_owned();
        self.settle_active(move |dialog| dialog.accept(Some(submitted)))
    }

    pub fn cancel(&mut self) -> bool {
        self.settle_active(OpenDialog::dismiss)
    }

    /// Backdrop or close-button dismissal; identical to cancel.
    pub fn dismiss(&mut self) -> bool {
        self.cancel()
    }

    /// Settles a specific dialog, active or queued, with its dismissal value.
    /// Closing an id that already settled is a no-op.
    pub fn close(&mut self, id: DialogId) -> bool {
        if self.active.as_ref().is_some_and(|dialog| dialog.id == id) {
            return self.cancel();
        }
        let Some(index) = self.queue.iter().position(|dialog| dialog.id == id) else {
            return false;
        };
        if let Some(dialog) = self.queue.remove(index) {
            dialog.dismiss();
        }
        true
    }

    /// Dismisses the active dialog and everything queued behind it.
    pub fn clear(&mut self) {
        if let Some(dialog) = self.active.take() {
            dialog.dismiss();
        }
        for dialog in self.queue.drain(..) {
            dialog.dismiss();
        }
    }

    pub fn push_char(&mut self, ch: char) -> bool {
        self.edit_input(|value| value.push(ch))
    }

    pub fn pop_char(&mut self) -> bool {
        self.edit_input(|value| {
            value.pop();
        })
    }

    pub fn set_input(&mut self, text: &str) -> bool {
        self.edit_input(|value| {
            value.clear();
            value.push_str(text);
        })
    }

    fn edit_input(&mut self, edit: impl FnOnce(&mut String)) -> bool {
        let Some(OpenDialog {
            body:
                DialogBody::TextInput {
                    params,
                    value,
                    error,
                    ..
                },
            ..
        }) = self.active.as_mut()
        else {
            return false;
        };

        edit(value);
        if error.is_some() && params.check(value).is_none() {
            *error = None;
        }
        true
    }

    fn open(&mut self, dialog: OpenDialog) {
        if self.active.is_none() {
            self.active = Some(dialog);
        } else {
            tracing::debug!(dialog_id = %dialog.id, queued = self.queue.len() + 1, "dialog queued behind active dialog");
            self.queue.push_back(dialog);
        }
    }

    fn settle_active(&mut self, settle: impl FnOnce(OpenDialog)) -> bool {
        let Some(dialog) = self.active.take() else {
            return false;
        };
        settle(dialog);
        self.active = self.queue.pop_front();
        true
    }

    fn allocate_id(&mut self) -> DialogId {
        self.next_id += 1;
        DialogId::new(self.next_id)
    }
}

impl Drop for DialogController {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfirmParams, DialogController, DialogKind, DialogTone, TextInputParams};
    use futures::executor::block_on;

    fn warning() -> ConfirmParams {
        ConfirmParams::new("Escape?", "Leave the battle?")
            .confirm_label("Yes")
            .cancel_label("Stay")
            .tone(DialogTone::Warning)
    }

    fn min_two_chars() -> TextInputParams {
        TextInputParams::new("Name", "Pick a name")
            .default_value("eevee")
            .validate(Box::new(|candidate: &str| {
                (candidate.trim().chars().count() < 2).then(|| "too short".to_owned())
            }))
    }

    #[test]
    fn confirm_resolves_true_and_returns_to_idle() {
        let mut dialogs = DialogController::new();
        let mut pending = dialogs.request_confirmation(warning());
        assert!(dialogs.is_open());
        assert_eq!(pending.try_settled(), None);

        assert!(dialogs.confirm());
        assert!(!dialogs.is_open());
        assert_eq!(pending.try_settled(), Some(true));
        assert_eq!(pending.try_settled(), None);
    }

    #[test]
    fn backdrop_dismissal_resolves_false() {
        let mut dialogs = DialogController::new();
        let pending = dialogs.request_confirmation(warning());
        assert!(dialogs.dismiss());
        assert!(!block_on(pending));
    }

    #[test]
    fn settlement_is_idempotent() {
        let mut dialogs = DialogController::new();
        let pending = dialogs.request_confirmation(warning());
        let id = pending.id();

        assert!(dialogs.confirm());
        assert!(!dialogs.confirm());
        assert!(!dialogs.cancel());
        assert!(!dialogs.close(id));
        assert!(block_on(pending));
    }

    #[test]
    fn submit_without_edits_resolves_default_value() {
        let mut dialogs = DialogController::new();
        let pending = dialogs.request_text_input(min_two_chars());
        assert!(dialogs.submit());
        assert_eq!(block_on(pending).as_deref(), Some("eevee"));
    }

    #[test]
    fn invalid_submit_keeps_dialog_open_with_inline_error() {
        let mut dialogs = DialogController::new();
        let mut pending = dialogs.request_text_input(min_two_chars());
        dialogs.set_input("e");

        assert!(!dialogs.submit());
        assert!(dialogs.is_open());
        assert_eq!(pending.try_settled(), None);
        match dialogs.active() {
            Some(super::DialogView::TextInput { error, value, .. }) => {
                assert_eq!(error, Some("too short"));
                assert_eq!(value, "e");
            }
            other => panic!("expected text input, got {other:?}"),
        }

        dialogs.push_char('v');
        match dialogs.active() {
            Some(super::DialogView::TextInput { error, .. }) => assert_eq!(error, None),
            other => panic!("expected text input, got {other:?}"),
        }

        assert!(dialogs.submit());
        assert_eq!(pending.try_settled(), Some(Some("ev".to_owned())));
    }

    #[test]
    fn edits_before_a_failed_submit_do_not_show_errors() {
        let mut dialogs = DialogController::new();
        let _pending = dialogs.request_text_input(min_two_chars());
        dialogs.set_input("");
        dialogs.push_char('x');
        match dialogs.active() {
            Some(super::DialogView::TextInput { error, .. }) => assert_eq!(error, None),
            other => panic!("expected text input, got {other:?}"),
        }
    }

    #[test]
    fn submitted_text_is_trimmed() {
        let mut dialogs = DialogController::new();
        let pending = dialogs.request_text_input(min_two_chars());
        dialogs.set_input("  Sparky ");
        assert!(dialogs.submit());
        assert_eq!(block_on(pending).as_deref(), Some("Sparky"));
    }

    #[test]
    fn cancelling_text_input_resolves_none() {
        let mut dialogs = DialogController::new();
        let pending = dialogs.request_text_input(min_two_chars());
        assert!(!dialogs.confirm());
        assert!(dialogs.cancel());
        assert_eq!(block_on(pending), None);
    }

    #[test]
    fn concurrent_requests_queue_in_order() {
        let mut dialogs = DialogController::new();
        let mut first = dialogs.request_confirmation(warning());
        let mut second = dialogs.request_text_input(min_two_chars());

        assert_eq!(dialogs.active().map(|view| view.id()), Some(first.id()));
        assert_eq!(dialogs.queued_len(), 1);

        assert!(dialogs.confirm());
        assert_eq!(first.try_settled(), Some(true));
        assert_eq!(
            dialogs.active().map(|view| view.kind()),
            Some(DialogKind::TextInput)
        );

        assert!(dialogs.cancel());
        assert_eq!(second.try_settled(), Some(None));
        assert!(!dialogs.is_open());
    }

    #[test]
    fn closing_a_queued_dialog_dismisses_only_that_request() {
        let mut dialogs = DialogController::new();
        let mut first = dialogs.request_confirmation(warning());
        let mut second = dialogs.request_confirmation(warning());

        assert!(dialogs.close(second.id()));
        assert_eq!(second.try_settled(), Some(false));
        assert_eq!(first.try_settled(), None);
        assert_eq!(dialogs.queued_len(), 0);
        assert!(dialogs.is_open());
    }

    #[test]
    fn clear_and_drop_dismiss_everything() {
        let mut dialogs = DialogController::new();
        let mut confirm = dialogs.request_confirmation(warning());
        let mut input = dialogs.request_text_input(min_two_chars());
        dialogs.clear();
        assert_eq!(confirm.try_settled(), Some(false));
        assert_eq!(input.try_settled(), Some(None));

        let pending = {
            let mut scoped = DialogController::new();
            scoped.request_confirmation(warning())
        };
        assert!(!block_on(pending));
    }

    #[test]
    fn dropped_handle_does_not_break_settlement() {
        let mut dialogs = DialogController::new();
        drop(dialogs.request_confirmation(warning()));
        assert!(dialogs.confirm());
        assert!(!dialogs.is_open());
    }

    #[test]
    fn edits_are_ignored_for_confirmations() {
        let mut dialogs = DialogController::new();
        let _pending = dialogs.request_confirmation(warning());
        assert!(!dialogs.push_char('x'));
        assert!(!dialogs.submit());
        assert_eq!(
            dialogs.active().map(|view| view.title().to_owned()),
            Some("Escape?".to_owned())
        );
    }
}
