use anyhow::Result;

use crate::analysis::{AttentionRotator, DedupLedger, ScoreOutcome, ScoringAdapter, SignalBuffer};
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::config::{ConfigIssue, SCHEDULER, SchedulerConfig, SchedulerSettings};
use crate::domain::{TrackedInstrument, WindowDescriptor, WindowWidth, active_names};
use crate::models::{SchedulerSnapshot, SignalRecord};
#[cfg(debug_assertions)]
use crate::utils::time_utils::{epoch_ms_to_clock, format_countdown};

use super::messages::{Notice, NoticeLevel, SchedulerEvent, TriggerResult, TriggerTicket};
use super::state::GateState;

/// The candle-synchronised analysis scheduler.
///
/// Owns the dedup ledger, the attention rotator and the result buffer. The
/// trigger gate lives in [`on_clock_tick`](Self::on_clock_tick) (synchronous
/// scorer) and [`begin_trigger`](Self::begin_trigger) /
/// [`complete_trigger`](Self::complete_trigger) (asynchronous scorer).
/// Timers are not owned here; see [`crate::engine::worker`].
pub struct Scheduler {
    settings: SchedulerSettings,
    ledger: DedupLedger,
    rotator: AttentionRotator,
    buffer: SignalBuffer,
    gate: GateState,
    window: Option<WindowDescriptor>,
    disabled_reason: Option<String>,

    /// Events waiting to be drained by the runtime / caller
    outbox: Vec<SchedulerEvent>,
    signal_seq: u64,
}

impl Scheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        let rotator = AttentionRotator::new(active_names(&settings.instruments));
        let buffer = SignalBuffer::new(settings.buffer_capacity);

        let mut scheduler = Self {
            settings,
            ledger: DedupLedger::new(),
            rotator,
            buffer,
            gate: GateState::Idle,
            window: None,
            disabled_reason: None,
            outbox: Vec::new(),
            signal_seq: 0,
        };
        scheduler.refresh_disabled_reason();
        scheduler
    }

    /// Validate `config`, report each fallback as a warning notice, and build.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let (settings, issues) = config.validate();
        let mut scheduler = Self::new(settings);
        for issue in issues {
            // Empty sets are already reported through the disabled reason
            if issue != ConfigIssue::NoInstruments {
                scheduler.notice(NoticeLevel::Warning, issue.to_string());
            }
        }
        scheduler
    }

    // --- CLOCK & WINDOW ---

    /// Recompute the window for `now_ms`, evict stale ledger entries and publish the tick.
    pub fn observe_window(&mut self, now_ms: i64) -> WindowDescriptor {
        let window =
            WindowDescriptor::at(now_ms, self.settings.width, self.settings.close_policy);

        if let Some(keep) = self.settings.ledger_retention_windows {
            let cutoff = window.start_ms - keep as i64 * window.width.as_ms();
            let _evicted = self.ledger.evict_older_than(cutoff);

            #[cfg(debug_assertions)]
            if DEBUG_FLAGS.print_ledger_evictions && _evicted > 0 {
                log::debug!("[ledger] evicted {} entries older than {}", _evicted, cutoff);
            }
        }

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_window_ticks {
            log::debug!(
                "🕐 window {} | {} left | closed: {}",
                window.id,
                format_countdown(window.seconds_remaining),
                window.is_closed
            );
        }

        self.window = Some(window);
        self.settle_gate();
        self.outbox.push(SchedulerEvent::WindowTick(window));
        window
    }

    /// One clock tick with a synchronous scorer.
    ///
    /// Check, score and mark happen in this one call with no suspension in
    /// between, so re-running the tick for the same window cannot fire twice.
    /// A failing scorer still marks the pair processed.
    pub fn on_clock_tick(
        &mut self,
        now_ms: i64,
        scorer: &dyn ScoringAdapter,
    ) -> Option<TriggerResult> {
        self.observe_window(now_ms);
        let (instrument, window) = self.eligible_pair()?;

        self.gate = GateState::Eligible {
            instrument: instrument.clone(),
            window: window.id,
        };
        self.log_trigger(&instrument, &window);

        let scored = scorer.score(&instrument, &window);

        self.ledger.mark_processed(&instrument, window.id);
        self.ledger.record_trigger(&instrument, now_ms);
        self.gate = GateState::Fired {
            instrument: instrument.clone(),
            window: window.id,
        };
        self.outbox.push(SchedulerEvent::TriggerFired {
            instrument: instrument.clone(),
            window,
        });

        Some(self.settle_outcome(&instrument, &window, scored, now_ms))
    }

    /// Asynchronous trigger, step 1: claim the eligible pair (in flight) and hand
    /// back a ticket. Nothing else is dispatched until the ticket settles.
    pub fn begin_trigger(&mut self, now_ms: i64) -> Option<TriggerTicket> {
        self.observe_window(now_ms);
        let (instrument, window) = self.eligible_pair()?;

        if !self.ledger.mark_in_flight(&instrument, window.id) {
            return None;
        }
        self.gate = GateState::InFlight {
            instrument: instrument.clone(),
            window: window.id,
        };
        self.log_trigger(&instrument, &window);
        self.outbox.push(SchedulerEvent::TriggerFired {
            instrument: instrument.clone(),
            window,
        });

        Some(TriggerTicket {
            instrument,
            window,
            generation: self.ledger.generation(),
        })
    }

    /// Asynchronous trigger, step 2: settle the claim.
    ///
    /// Failures and timeouts settle the pair as processed too, exactly like the
    /// synchronous path, so a failing scorer is called once per window.
    pub fn complete_trigger(
        &mut self,
        ticket: TriggerTicket,
        scored: Result<ScoreOutcome>,
        now_ms: i64,
    ) -> TriggerResult {
        if ticket.generation != self.ledger.generation() {
            log::debug!(
                "[{}] dropping result for window {} (configuration changed)",
                ticket.instrument,
                ticket.window.id
            );
            return TriggerResult::Stale;
        }

        let TriggerTicket {
            instrument, window, ..
        } = ticket;
        let owns_gate = self.gate.is_in_flight()
            && self.gate.pair() == Some((instrument.as_str(), &window.id));

        self.ledger.commit(&instrument, window.id);
        self.ledger.record_trigger(&instrument, now_ms);
        if owns_gate {
            self.gate = GateState::Fired {
                instrument: instrument.clone(),
                window: window.id,
            };
        }
        self.settle_outcome(&instrument, &window, scored, now_ms)
    }

    // --- ATTENTION ROTATION ---

    /// Advance the attention slot. Independent of the clock tick.
    pub fn on_rotation_tick(&mut self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let live = self.rotator.rotate().map(str::to_string);

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_rotation {
            log::info!("🔄 Attention rotated → {}", live.as_deref().unwrap_or("-"));
        }

        self.outbox.push(SchedulerEvent::Rotated { live: live.clone() });
        self.settle_gate();
        live
    }

    // --- CONTROL ---

    /// Stop analysing. Ledger and rotation position are left as they are.
    pub fn pause(&mut self) {
        if self.settings.running {
            self.settings.running = false;
            self.notice(NoticeLevel::Info, "⏸️ Analysis paused");
        }
    }

    /// Returns `false` (and reports why) when the scheduler is disabled.
    pub fn resume(&mut self) -> bool {
        self.settings.running = true;
        if let Some(reason) = self.disabled_reason.clone() {
            self.notice(
                NoticeLevel::Warning,
                format!("cannot start analysis: {}", reason),
            );
            return false;
        }
        self.notice(NoticeLevel::Info, "🚀 Analysis running");
        true
    }

    /// Changing the width invalidates every known window id.
    pub fn set_width(&mut self, width: WindowWidth) {
        if width == self.settings.width {
            return;
        }
        self.settings.width = width;
        self.reset_for_reconfiguration(format!("window width set to {}", width));
    }

    /// Replace the tracked set. Resets the ledger; rotation keeps its place
    /// when the live instrument survives.
    ///
    /// If the live instrument was removed, nothing is live (and nothing fires)
    /// until the next rotation tick picks the first instrument of the new set.
    /// The reconfiguration notice says so.
    pub fn set_instruments(&mut self, instruments: Vec<TrackedInstrument>) {
        self.rotator.set_instruments(active_names(&instruments));
        self.settings.instruments = instruments;

        let tracked = self.rotator.instruments().len();
        let reason = match self.rotator.live() {
            None if tracked > 0 => format!(
                "tracking {} instruments, live instrument removed (attention resumes at {} on the next rotation)",
                tracked,
                self.rotator.instruments()[0]
            ),
            _ => format!("tracking {} instruments", tracked),
        };
        self.reset_for_reconfiguration(reason);
        self.refresh_disabled_reason();
    }

    pub fn set_min_confidence(&mut self, value: i64) {
        let (lo, hi) = (
            SCHEDULER.confidence.min as i64,
            SCHEDULER.confidence.max as i64,
        );
        if !(lo..=hi).contains(&value) {
            self.notice(
                NoticeLevel::Warning,
                ConfigIssue::MinConfidenceOutOfRange(value).to_string(),
            );
        }
        self.settings.min_confidence = value.clamp(lo, hi) as u8;
    }

    // --- ACCESSORS ---

    /// Running and not disabled.
    pub fn is_active(&self) -> bool {
        self.settings.running && self.disabled_reason.is_none()
    }

    pub fn is_running(&self) -> bool {
        self.settings.running
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn rotator(&self) -> &AttentionRotator {
        &self.rotator
    }

    pub fn signals(&self) -> &SignalBuffer {
        &self.buffer
    }

    pub fn gate(&self) -> &GateState {
        &self.gate
    }

    pub fn window(&self) -> Option<&WindowDescriptor> {
        self.window.as_ref()
    }

    pub fn live_instrument(&self) -> Option<&str> {
        self.rotator.live()
    }

    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            running: self.settings.running,
            disabled_reason: self.disabled_reason.clone(),
            width: self.settings.width,
            min_confidence: self.settings.min_confidence,
            window: self.window,
            live_instrument: self.rotator.live().map(str::to_string),
            tracked: self.rotator.instruments().to_vec(),
            gate: self.gate.clone(),
            signals: self.buffer.to_vec(),
            average_confidence: self.buffer.average_confidence(),
        }
    }

    // --- INTERNAL LOGIC ---

    /// The pair the gate would fire for right now. Reads the live instrument at
    /// call time, never a cached copy.
    fn eligible_pair(&self) -> Option<(String, WindowDescriptor)> {
        if !self.is_active() || self.gate.is_in_flight() {
            return None;
        }
        let window = self.window?;
        if !window.is_closed {
            return None;
        }
        let live = self.rotator.live()?;
        if self.ledger.has_processed(live, &window.id) {
            return None;
        }
        Some((live.to_string(), window))
    }

    /// Back to `Idle` once the window reopens, turns over, or attention moves on.
    /// In-flight claims only settle through `complete_trigger`.
    fn settle_gate(&mut self) {
        let live = self.rotator.live();
        let back_to_idle = match &self.gate {
            GateState::Idle | GateState::InFlight { .. } => false,
            GateState::Eligible { instrument, window } | GateState::Fired { instrument, window } => {
                match &self.window {
                    Some(current) => {
                        !current.is_closed
                            || current.id != *window
                            || live != Some(instrument.as_str())
                    }
                    None => true,
                }
            }
        };
        if back_to_idle {
            log::debug!("gate {} -> idle", self.gate.label());
            self.gate = GateState::Idle;
        }
    }

    fn settle_outcome(
        &mut self,
        instrument: &str,
        window: &WindowDescriptor,
        scored: Result<ScoreOutcome>,
        now_ms: i64,
    ) -> TriggerResult {
        let outcome = match scored {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!(
                    "scoring failed for {} in window {}: {:#}",
                    instrument, window.id, e
                );
                self.notice(NoticeLevel::Error, message.clone());
                return TriggerResult::Failed(message);
            }
        };

        let min_confidence = self.settings.min_confidence;
        if !outcome.accepted || outcome.confidence < min_confidence {
            log::info!(
                "⚠️ [{}] no signal: confidence {}% (min {}%){}",
                instrument,
                outcome.confidence,
                min_confidence,
                if outcome.accepted { "" } else { ", setup rejected" }
            );
            self.outbox.push(SchedulerEvent::SignalDiscarded {
                instrument: instrument.to_string(),
                window_id: window.id,
                confidence: outcome.confidence,
                min_confidence,
            });
            return TriggerResult::Discarded {
                confidence: outcome.confidence,
            };
        }

        self.signal_seq += 1;
        let id = format!("{}-{}", now_ms, self.signal_seq);
        let record = SignalRecord::from_outcome(id, instrument, window, outcome, now_ms);
        log::info!("✅ Signal: {}", record.description());

        self.buffer.push(record.clone());
        self.outbox
            .push(SchedulerEvent::SignalAccepted(record.clone()));
        TriggerResult::Accepted(record)
    }

    fn reset_for_reconfiguration(&mut self, reason: String) {
        self.ledger.reset();
        self.gate = GateState::Idle;
        self.window = None;
        self.notice(
            NoticeLevel::Info,
            format!("{}: processed windows cleared", reason),
        );
    }

    fn refresh_disabled_reason(&mut self) {
        let reason = if self.rotator.instruments().is_empty() {
            Some(ConfigIssue::NoInstruments.to_string())
        } else {
            None
        };
        if reason == self.disabled_reason {
            return;
        }
        match &reason {
            Some(r) => self.notice(NoticeLevel::Warning, format!("scheduler disabled: {}", r)),
            None => self.notice(NoticeLevel::Info, "scheduler enabled"),
        }
        self.disabled_reason = reason;
    }

    fn log_trigger(&self, _instrument: &str, _window: &WindowDescriptor) {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_gate_decisions {
            log::info!(
                "🎯 [{}] window {} closes at {} - analysing",
                _instrument,
                _window.id,
                epoch_ms_to_clock(_window.end_ms)
            );
        }
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Warning => log::warn!("⚠️  {}", message),
            NoticeLevel::Error => log::error!("❌ {}", message),
        }
        self.outbox
            .push(SchedulerEvent::Notice(Notice { level, message }));
    }
}
