use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, timeout};

use crate::analysis::{AsyncScoringAdapter, ScoreOutcome};
use crate::config::SCHEDULER;
use crate::models::SchedulerSnapshot;
use crate::utils::WallClock;

use super::core::Scheduler;
use super::messages::{Command, SchedulerEvent, TriggerTicket};

type Completion = (TriggerTicket, Result<ScoreOutcome>);

/// Owner-side handle to a running scheduler task.
///
/// Dropping the handle aborts the task; [`shutdown`](Self::shutdown) stops it
/// cleanly and hands the scheduler back.
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SchedulerEvent>,
    snapshot: watch::Receiver<SchedulerSnapshot>,
    task: Option<JoinHandle<Scheduler>>,
}

impl SchedulerHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|e| anyhow!("scheduler task is gone, dropped {:?}", e.0))
    }

    pub async fn next_event(&mut self) -> Option<SchedulerEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SchedulerEvent> {
        self.events.try_recv().ok()
    }

    /// Everything published since the last drain.
    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerSnapshot> {
        self.snapshot.clone()
    }

    pub async fn shutdown(mut self) -> Result<Scheduler> {
        // The task may already have stopped; the join below reports that
        let _ = self.commands.send(Command::Shutdown);
        let task = self
            .task
            .take()
            .context("scheduler task already joined")?;
        task.await.context("scheduler task did not finish cleanly")
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Move `scheduler` onto a tokio task driven by two independent timers:
/// the clock tick (window evaluation + trigger gate) and the rotation tick.
///
/// Scoring runs on its own task so a slow scorer never delays either timer.
/// Must be called from within a tokio runtime.
pub fn spawn_scheduler(
    scheduler: Scheduler,
    clock: Arc<dyn WallClock>,
    scorer: Arc<dyn AsyncScoringAdapter>,
) -> SchedulerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(scheduler.snapshot());

    let task = tokio::spawn(run_scheduler(
        scheduler,
        clock,
        scorer,
        command_rx,
        event_tx,
        snapshot_tx,
    ));

    SchedulerHandle {
        commands: command_tx,
        events: event_rx,
        snapshot: snapshot_rx,
        task: Some(task),
    }
}

async fn run_scheduler(
    mut scheduler: Scheduler,
    clock: Arc<dyn WallClock>,
    scorer: Arc<dyn AsyncScoringAdapter>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    snapshot: watch::Sender<SchedulerSnapshot>,
) -> Scheduler {
    let mut clock_tick = interval(Duration::from_millis(SCHEDULER.cadence.clock_tick_ms));
    clock_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let rotation_period = scheduler.settings().rotation_period;
    let mut rotation_tick = interval_at(Instant::now() + rotation_period, rotation_period);
    rotation_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

    log::info!(
        "🚀 Scheduler started: {} windows, {} instruments, rotation every {:?}",
        scheduler.settings().width,
        scheduler.rotator().instruments().len(),
        rotation_period
    );
    publish(&mut scheduler, &events, &snapshot);

    loop {
        // Paused: neither timer branch is polled
        let running = scheduler.is_running();

        tokio::select! {
            _ = clock_tick.tick(), if running => {
                if let Some(ticket) = scheduler.begin_trigger(clock.now_ms()) {
                    dispatch(ticket, scorer.clone(), done_tx.clone());
                }
            }
            _ = rotation_tick.tick(), if running => {
                scheduler.on_rotation_tick();
            }
            Some((ticket, scored)) = done_rx.recv() => {
                scheduler.complete_trigger(ticket, scored, clock.now_ms());
            }
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => {
                    publish(&mut scheduler, &events, &snapshot);
                    break;
                }
                Some(command) => {
                    let resumed = matches!(command, Command::Resume) && !running;
                    apply_command(&mut scheduler, command);
                    if resumed {
                        clock_tick.reset_immediately();
                        rotation_tick.reset();
                    }
                }
            },
        }

        publish(&mut scheduler, &events, &snapshot);
    }

    log::info!("⏹️ Scheduler stopped");
    scheduler
}

fn apply_command(scheduler: &mut Scheduler, command: Command) {
    match command {
        Command::Pause => scheduler.pause(),
        Command::Resume => {
            scheduler.resume();
        }
        Command::SetWidth(width) => scheduler.set_width(width),
        Command::SetInstruments(instruments) => scheduler.set_instruments(instruments),
        Command::SetMinConfidence(value) => scheduler.set_min_confidence(value),
        Command::Shutdown => {}
    }
}

fn dispatch(
    ticket: TriggerTicket,
    scorer: Arc<dyn AsyncScoringAdapter>,
    done: mpsc::UnboundedSender<Completion>,
) {
    let limit = Duration::from_millis(SCHEDULER.cadence.scoring_timeout_ms);
    tokio::spawn(async move {
        let (instrument, window) = (ticket.instrument.clone(), ticket.window);
        // Own task, so a panicking scorer still produces a completion
        let mut scoring = tokio::spawn(async move { scorer.score(instrument, window).await });

        let scored = match timeout(limit, &mut scoring).await {
            Ok(Ok(scored)) => scored,
            Ok(Err(e)) => Err(anyhow!("scoring task failed: {}", e)),
            Err(_) => {
                scoring.abort();
                Err(anyhow!("scoring timed out after {:?}", limit))
            }
        };
        // Receiver gone means the scheduler stopped; nothing left to settle
        let _ = done.send((ticket, scored));
    });
}

fn publish(
    scheduler: &mut Scheduler,
    events: &mpsc::UnboundedSender<SchedulerEvent>,
    snapshot: &watch::Sender<SchedulerSnapshot>,
) {
    for event in scheduler.drain_events() {
        // Nobody listening is fine
        let _ = events.send(event);
    }
    snapshot.send_replace(scheduler.snapshot());
}
