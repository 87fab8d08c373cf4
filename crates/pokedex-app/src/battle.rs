// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The capture mini-game: throw, roll, name, persist, leave.
//!
//! `CaptureWorkflow` is an explicit state machine driven by [`CaptureWorkflow::poll`]
//! from the UI event loop. Every suspension is either a deadline the workflow
//! owns or a single [`Pending`] dialog handle; nothing blocks.

use anyhow::{Context, Result};
use rand::distr::Bernoulli;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use std::time::{Duration, Instant};

use crate::collection::CollectionStore;
use crate::dialog::{ConfirmParams, DialogController, DialogTone, Pending, TextInputParams};
use crate::ids::DialogId;
use crate::model::{CatalogEntryDetail, NewCapture};
use crate::nickname::NicknameRules;

pub const DEFAULT_CAPTURE_PROBABILITY: f64 = 0.5;
pub const DEFAULT_THROW_DURATION: Duration = Duration::from_millis(1500);
pub const DEFAULT_LEAVE_DELAY: Duration = Duration::from_millis(500);

/// Receives the "leave this screen" request once a battle ends in a way that
/// navigates away.
pub trait Navigator {
    fn complete(&mut self);
}

pub struct CaptureChance {
    probability: f64,
    chance: Bernoulli,
    rng: Box<dyn RngCore>,
}

impl CaptureChance {
    pub fn new(probability: f64, rng: Box<dyn RngCore>) -> Result<Self> {
        let chance = Bernoulli::new(probability).with_context(|| {
            format!("capture probability must be within 0.0..=1.0, got {probability}")
        })?;
        Ok(Self {
            probability,
            chance,
            rng,
        })
    }

    pub fn seeded(probability: f64, seed: u64) -> Result<Self> {
        Self::new(probability, Box::new(StdRng::seed_from_u64(seed)))
    }

    pub fn from_thread_rng(probability: f64) -> Result<Self> {
        Self::new(probability, Box::new(rand::rng()))
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn roll(&mut self) -> bool {
        self.rng.sample(self.chance)
    }
}

impl fmt::Debug for CaptureChance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureChance")
            .field("probability", &self.probability)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleTiming {
    pub throw_duration: Duration,
    pub leave_delay: Duration,
}

impl Default for BattleTiming {
    fn default() -> Self {
        Self {
            throw_duration: DEFAULT_THROW_DURATION,
            leave_delay: DEFAULT_LEAVE_DELAY,
        }
    }
}

/// Everything a poll may touch besides the workflow itself.
pub struct BattleContext<'a> {
    pub dialogs: &'a mut DialogController,
    pub collection: &'a mut dyn CollectionStore,
    pub navigator: &'a mut dyn Navigator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleStage {
    Idle,
    Throwing,
    AwaitingOutcomeDialog,
    AwaitingNickname,
    AwaitingReleaseConfirm,
    Persisting,
    AwaitingFinalChoice,
    AwaitingEscapeConfirm,
    Leaving,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleEvent {
    BrokeFree,
    NicknameRequested,
    Captured { nickname: String },
    SaveFailed,
    Released,
    ReleaseDeclined,
    EscapeRequested,
    Navigated,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    Escaped,
    Released,
    SaveFailed,
}

#[derive(Debug)]
enum BattlePhase {
    Idle,
    Throwing { until: Instant },
    AwaitingOutcomeDialog { pending: Pending<bool>, notice: Notice },
    AwaitingNickname { pending: Pending<Option<String>> },
    AwaitingReleaseConfirm { pending: Pending<bool> },
    Persisting { nickname: String },
    AwaitingFinalChoice { pending: Pending<bool> },
    AwaitingEscapeConfirm { pending: Pending<bool> },
    Leaving { until: Instant },
    Done,
}

impl BattlePhase {
    fn stage(&self) -> BattleStage {
        match self {
            Self::Idle => BattleStage::Idle,
            Self::Throwing { .. } => BattleStage::Throwing,
            Self::AwaitingOutcomeDialog { .. } => BattleStage::AwaitingOutcomeDialog,
            Self::AwaitingNickname { .. } => BattleStage::AwaitingNickname,
            Self::AwaitingReleaseConfirm { .. } => BattleStage::AwaitingReleaseConfirm,
            Self::Persisting { .. } => BattleStage::Persisting,
            Self::AwaitingFinalChoice { .. } => BattleStage::AwaitingFinalChoice,
            Self::AwaitingEscapeConfirm { .. } => BattleStage::AwaitingEscapeConfirm,
            Self::Leaving { .. } => BattleStage::Leaving,
            Self::Done => BattleStage::Done,
        }
    }

    fn pending_dialog(&self) -> Option<DialogId> {
        match self {
            Self::AwaitingOutcomeDialog { pending, .. }
            | Self::AwaitingReleaseConfirm { pending }
            | Self::AwaitingFinalChoice { pending }
            | Self::AwaitingEscapeConfirm { pending } => Some(pending.id()),
            Self::AwaitingNickname { pending } => Some(pending.id()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CaptureWorkflow {
    entry: CatalogEntryDetail,
    chance: CaptureChance,
    timing: BattleTiming,
    phase: BattlePhase,
    visible: bool,
    caught: bool,
}

impl CaptureWorkflow {
    pub fn new(entry: CatalogEntryDetail, chance: CaptureChance, timing: BattleTiming) -> Self {
        Self {
            entry,
            chance,
            timing,
            phase: BattlePhase::Idle,
            visible: true,
            caught: false,
        }
    }

    /// Marks the entry as already owned before any attempt is made.
    pub fn with_caught(mut self, caught: bool) -> Self {
        self.caught = caught;
        self
    }

    pub fn entry(&self) -> &CatalogEntryDetail {
        &self.entry
    }

    pub fn stage(&self) -> BattleStage {
        self.phase.stage()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_caught(&self) -> bool {
        self.caught
    }

    pub fn is_throwing(&self) -> bool {
        self.stage() == BattleStage::Throwing
    }

    pub fn in_flight(&self) -> bool {
        !matches!(self.phase, BattlePhase::Idle | BattlePhase::Done)
    }

    /// Starts a throw. Ignored while another attempt is in flight or after the
    /// creature has left.
    pub fn attempt_capture(&mut self, now: Instant) -> bool {
        if self.in_flight() {
            tracing::warn!(name = %self.entry.name, stage = ?self.stage(), "capture ignored: attempt already in flight");
            return false;
        }
        if !self.visible {
            tracing::debug!(name = %self.entry.name, "capture ignored: creature is gone");
            return false;
        }
        tracing::info!(name = %self.entry.name, "throw started");
        self.phase = BattlePhase::Throwing {
            until: now + self.timing.throw_duration,
        };
        true
    }

    pub fn attempt_escape(&mut self, dialogs: &mut DialogController) -> bool {
        if self.in_flight() {
            tracing::warn!(name = %self.entry.name, stage = ?self.stage(), "escape ignored: attempt already in flight");
            return false;
        }
        let pending = dialogs.request_confirmation(escape_confirm(&self.entry.name));
        self.phase = BattlePhase::AwaitingEscapeConfirm { pending };
        true
    }

    /// Tears the attempt down: pending timers are forgotten and the dialog
    /// this workflow is waiting on is closed.
    pub fn abort(&mut self, dialogs: &mut DialogController) {
        if let Some(id) = self.phase.pending_dialog() {
            dialogs.close(id);
        }
        if self.in_flight() {
            tracing::debug!(name = %self.entry.name, stage = ?self.stage(), "battle aborted");
        }
        self.phase = BattlePhase::Idle;
    }

    /// Advances through every transition that is ready at `now`.
    pub fn poll(&mut self, now: Instant, ctx: &mut BattleContext<'_>) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        loop {
            let phase = std::mem::replace(&mut self.phase, BattlePhase::Idle);
            let before = phase.stage();
            let (next, progressed) = self.step(phase, now, ctx, &mut events);
            if progressed {
                tracing::debug!(name = %self.entry.name, from = ?before, to = ?next.stage(), "battle transition");
            }
            self.phase = next;
            if !progressed {
                break;
            }
        }
        events
    }

    fn step(
        &mut self,
        phase: BattlePhase,
        now: Instant,
        ctx: &mut BattleContext<'_>,
        events: &mut Vec<BattleEvent>,
    ) -> (BattlePhase, bool) {
        match phase {
            BattlePhase::Idle | BattlePhase::Done => (phase, false),
            BattlePhase::Throwing { until } if now < until => (phase, false),
            BattlePhase::Throwing { .. } => {
                if self.chance.roll() {
                    tracing::info!(name = %self.entry.name, "capture roll succeeded");
                    events.push(BattleEvent::NicknameRequested);
                    let rules = match ctx.collection.nicknames() {
                        Ok(taken) => NicknameRules::new(taken),
                        Err(error) => {
                            tracing::warn!(error = %format!("{error:#}"), "load nicknames for validation failed");
                            NicknameRules::default()
                        }
                    };
                    let pending = ctx
                        .dialogs
                        .request_text_input(nickname_input(&self.entry.name, rules));
                    (BattlePhase::AwaitingNickname { pending }, true)
                } else {
                    tracing::info!(name = %self.entry.name, "capture roll failed");
                    self.visible = false;
                    events.push(BattleEvent::BrokeFree);
                    let pending = ctx
                        .dialogs
                        .request_confirmation(escaped_notice(&self.entry.name));
                    (
                        BattlePhase::AwaitingOutcomeDialog {
                            pending,
                            notice: Notice::Escaped,
                        },
                        true,
                    )
                }
            }
            BattlePhase::AwaitingOutcomeDialog {
                mut pending,
                notice,
            } => match pending.try_settled() {
                None => (BattlePhase::AwaitingOutcomeDialog { pending, notice }, false),
                Some(_) => {
                    tracing::debug!(name = %self.entry.name, notice = ?notice, "outcome acknowledged");
                    finish(events)
                }
            },
            BattlePhase::AwaitingNickname { mut pending } => match pending.try_settled() {
                None => (BattlePhase::AwaitingNickname { pending }, false),
                Some(Some(nickname)) if !nickname.is_empty() => {
                    (BattlePhase::Persisting { nickname }, true)
                }
                Some(_) => {
                    let pending = ctx.dialogs.request_confirmation(release_confirm());
                    (BattlePhase::AwaitingReleaseConfirm { pending }, true)
                }
            },
            BattlePhase::AwaitingReleaseConfirm { mut pending } => match pending.try_settled() {
                None => (BattlePhase::AwaitingReleaseConfirm { pending }, false),
                Some(true) => {
                    tracing::info!(name = %self.entry.name, "released");
                    events.push(BattleEvent::Released);
                    let pending = ctx
                        .dialogs
                        .request_confirmation(released_notice(&self.entry.name));
                    (
                        BattlePhase::AwaitingOutcomeDialog {
                            pending,
                            notice: Notice::Released,
                        },
                        true,
                    )
                }
                Some(false) => {
                    events.push(BattleEvent::ReleaseDeclined);
                    finish(events)
                }
            },
            BattlePhase::Persisting { nickname } => {
                let capture = NewCapture {
                    id: self.entry.id,
                    name: self.entry.name.clone(),
                    nickname,
                };
                let saved = match ctx.collection.add(&capture) {
                    Ok(saved) => saved,
                    Err(error) => {
                        tracing::error!(error = %format!("{error:#}"), nickname = %capture.nickname, "save capture failed");
                        false
                    }
                };
                if saved {
                    tracing::info!(name = %capture.name, nickname = %capture.nickname, "captured");
                    self.caught = true;
                    let pending = ctx
                        .dialogs
                        .request_confirmation(success_choice(&capture.name, &capture.nickname));
                    events.push(BattleEvent::Captured {
                        nickname: capture.nickname,
                    });
                    (BattlePhase::AwaitingFinalChoice { pending }, true)
                } else {
                    tracing::warn!(nickname = %capture.nickname, "capture not saved");
                    events.push(BattleEvent::SaveFailed);
                    let pending = ctx.dialogs.request_confirmation(save_failed_notice());
                    (
                        BattlePhase::AwaitingOutcomeDialog {
                            pending,
                            notice: Notice::SaveFailed,
                        },
                        true,
                    )
                }
            }
            BattlePhase::AwaitingFinalChoice { mut pending } => match pending.try_settled() {
                None => (BattlePhase::AwaitingFinalChoice { pending }, false),
                Some(true) => (
                    BattlePhase::Leaving {
                        until: now + self.timing.leave_delay,
                    },
                    true,
                ),
                Some(false) => finish(events),
            },
            BattlePhase::AwaitingEscapeConfirm { mut pending } => match pending.try_settled() {
                None => (BattlePhase::AwaitingEscapeConfirm { pending }, false),
                Some(true) => {
                    tracing::info!(name = %self.entry.name, "escaped from battle");
                    self.visible = false;
                    events.push(BattleEvent::EscapeRequested);
                    (
                        BattlePhase::Leaving {
                            until: now + self.timing.leave_delay,
                        },
                        true,
                    )
                }
                Some(false) => finish(events),
            },
            BattlePhase::Leaving { until } if now < until => (phase, false),
            BattlePhase::Leaving { .. } => {
                ctx.navigator.complete();
                events.push(BattleEvent::Navigated);
                finish(events)
            }
        }
    }
}

fn finish(events: &mut Vec<BattleEvent>) -> (BattlePhase, bool) {
    events.push(BattleEvent::Finished);
    (BattlePhase::Done, true)
}

fn escaped_notice(name: &str) -> ConfirmParams {
    ConfirmParams::new(
        "Pokemon Escaped!",
        format!(
            "{name} broke free and ran away! The wild Pokemon was too quick to catch this time."
        ),
    )
    .confirm_label("Try Again")
    .cancel_label("Go Back")
    .tone(DialogTone::Warning)
}

fn nickname_input(name: &str, rules: NicknameRules) -> TextInputParams {
    TextInputParams::new(
        "Pokemon Caught!",
        format!(
            "Amazing! You successfully caught {name}! Now give your new Pokemon a special nickname:"
        ),
    )
    .placeholder("Enter nickname...")
    .default_value(name)
    .confirm_label("Save Pokemon")
    .cancel_label("Release Pokemon")
    .validate(rules.into_validator())
}

fn release_confirm() -> ConfirmParams {
    ConfirmParams::new(
        "Release Pokemon?",
        "Are you sure you want to release this Pokemon back to the wild? This action cannot be undone.",
    )
    .confirm_label("Yes, Release")
    .cancel_label("Keep Pokemon")
    .tone(DialogTone::Warning)
}

fn released_notice(name: &str) -> ConfirmParams {
    ConfirmParams::new(
        "Pokemon Released",
        format!(
            "{name} has been released back to the wild. It waves goodbye as it disappears into nature."
        ),
    )
    .confirm_label("Continue")
}

fn save_failed_notice() -> ConfirmParams {
    ConfirmParams::new(
        "Save Failed!",
        "Something went wrong while saving your Pokemon. Please check your storage and try again.",
    )
    .confirm_label("OK")
    .tone(DialogTone::Error)
}

fn success_choice(name: &str, nickname: &str) -> ConfirmParams {
    ConfirmParams::new(
        "Success!",
        format!(
            "Congratulations! {name} \"{nickname}\" has been added to your Pokemon collection! Ready to catch more Pokemon or return home?"
        ),
    )
    .confirm_label("Go Home")
    .cancel_label("Catch More")
    .tone(DialogTone::Celebration)
}

fn escape_confirm(name: &str) -> ConfirmParams {
    ConfirmParams::new(
        "Escape Battle?",
        format!(
            "Are you sure you want to escape from the battle with {name}? You'll return to safety but miss the chance to catch this Pokemon."
        ),
    )
    .confirm_label("Yes, Escape")
    .cancel_label("Stay and Fight")
    .tone(DialogTone::Warning)
}
