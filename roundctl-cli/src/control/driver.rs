use std::future::Future;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use roundctl_core::clock_sync::{ClockOffset, ServerClock};
use roundctl_core::constants::{MSG_COMMIT_FAILED, ROUND_SECONDS};
use roundctl_core::error::{Result, RoundCtlError};
use roundctl_core::gate::{can_submit, Mode};
use roundctl_core::round::store::{load_round, save_round};
use roundctl_core::round::{CommitRequest, RoundController, RoundSnapshot};
use roundctl_core::traits::clock::Clock;
use roundctl_core::traits::storage::PersistentStorage;
use roundctl_core::traits::transport::GameTransport;

/// Operator actions fed into the running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Select(u8),
    ToggleMode,
    Submit,
    Quit,
}

/// Everything the panel needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Synced { offset_millis: i64, round: u64, mode: Mode },
    Tick { server_second: u8, seconds_left: u8, window_open: bool },
    RoundAdvanced { round: u64 },
    Selected { number: u8 },
    ModeChanged { mode: Mode },
    CommitStarted { number: u8 },
    CommitSucceeded { number: u8 },
    CommitFailed { message: String },
    Resynced { offset_millis: i64 },
    Warning(String),
}

#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub tick_interval: Duration,
    pub resync_interval: Option<Duration>,
}

type CommitFuture<'a> = LocalBoxFuture<'a, (CommitRequest, Result<u8>)>;
type ResyncFuture<'a> = LocalBoxFuture<'a, Result<ClockOffset>>;

/// Round counter writes, one at a time and in order.
///
/// Only the newest queued value is kept; older ones are superseded.
struct RoundWrites<'a> {
    in_flight: Option<LocalBoxFuture<'a, ()>>,
    queued: Option<u64>,
}

/// Owns the round timer for one control session.
///
/// The loop is a single task: ticks, operator commands, commit responses
/// and re-syncs are handled one at a time in `select!` order, so no tick
/// ever overlaps another. Nothing is awaited inside a handler: commits,
/// re-sync fetches and round counter writes are polled alongside the
/// ticker and never hold it up. Returning from [`RoundDriver::run`] drops
/// the interval, every in-flight commit and any pending re-sync, so
/// nothing fires after teardown. The last round counter write is flushed.
pub struct RoundDriver<'a, C, T, S>
where
    C: Clock,
    T: GameTransport,
    S: PersistentStorage,
{
    clock: &'a C,
    transport: &'a T,
    storage: &'a S,
    settings: DriverSettings,
    events: mpsc::UnboundedSender<ControlEvent>,
}

impl<'a, C, T, S> RoundDriver<'a, C, T, S>
where
    C: Clock,
    T: GameTransport,
    S: PersistentStorage,
{
    pub fn new(
        clock: &'a C,
        transport: &'a T,
        storage: &'a S,
        settings: DriverSettings,
        events: mpsc::UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            clock,
            transport,
            storage,
            settings,
            events,
        }
    }

    /// Fetch the server time once and derive the clock offset.
    pub async fn sync_clock(&self) -> Result<ClockOffset> {
        sample_offset(self.clock, self.transport).await
    }

    /// Run until `Quit` arrives or the command channel closes.
    ///
    /// Fails before the first tick if the server time cannot be fetched.
    pub async fn run(
        &self,
        mode: Mode,
        mut commands: mpsc::Receiver<OperatorCommand>,
    ) -> Result<RoundSnapshot> {
        let offset = self.sync_clock().await?;
        let round = load_round(self.storage).await?;
        let mut controller = RoundController::new(round, mode);
        let mut server_clock = ServerClock::new(offset);

        info!(round, %mode, offset_ms = offset.millis(), "round control started");
        self.emit(ControlEvent::Synced {
            offset_millis: offset.millis(),
            round,
            mode,
        });

        let mut ticker = time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut resync: Option<Interval> = self.settings.resync_interval.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut resync_in_flight: Option<ResyncFuture<'a>> = None;

        let mut in_flight: FuturesUnordered<CommitFuture<'a>> = FuturesUnordered::new();
        let mut writes = RoundWrites {
            in_flight: None,
            queued: None,
        };
        let mut last_second: Option<u8> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let server_second = server_clock.second(self.clock.now_millis()?);
                    let outcome = controller.tick(server_second);

                    if last_second != Some(server_second) {
                        last_second = Some(server_second);
                        self.emit(ControlEvent::Tick {
                            server_second,
                            seconds_left: ROUND_SECONDS - server_second,
                            window_open: can_submit(server_second),
                        });
                    }

                    if let Some(request) = outcome.commit {
                        info!(number = request.number, "auto-committing winning number");
                        in_flight.push(self.start_commit(request));
                    }
                    if outcome.round_advanced {
                        self.queue_round_write(&mut writes, controller.round());
                        self.emit(ControlEvent::RoundAdvanced { round: controller.round() });
                    }
                }

                command = commands.recv() => {
                    match command {
                        None | Some(OperatorCommand::Quit) => break,
                        Some(command) => {
                            let server_second = server_clock.second(self.clock.now_millis()?);
                            if let Some(request) = self.handle_command(&mut controller, command, server_second) {
                                in_flight.push(self.start_commit(request));
                                self.queue_round_write(&mut writes, controller.round());
                                self.emit(ControlEvent::RoundAdvanced { round: controller.round() });
                            }
                        }
                    }
                }

                Some((request, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.finish_commit(&mut controller, request, result);
                }

                () = next_pending(&mut writes.in_flight) => {
                    writes.in_flight = None;
                    if let Some(round) = writes.queued.take() {
                        self.queue_round_write(&mut writes, round);
                    }
                }

                _ = next_resync(&mut resync), if resync.is_some() => {
                    if resync_in_flight.is_some() {
                        debug!("previous clock re-sync still running, skipping");
                    } else {
                        resync_in_flight = Some(sample_offset(self.clock, self.transport).boxed_local());
                    }
                }

                result = next_pending(&mut resync_in_flight) => {
                    resync_in_flight = None;
                    match result {
                        Ok(fresh) => {
                            let old = server_clock.set_offset(fresh);
                            info!(old_ms = old.millis(), new_ms = fresh.millis(), "server clock re-synced");
                            self.emit(ControlEvent::Resynced { offset_millis: fresh.millis() });
                        }
                        Err(e) => warn!(error = %e, "clock re-sync failed, keeping previous offset"),
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            debug!(pending = in_flight.len(), "dropping in-flight commits on teardown");
        }
        if let Some(write) = writes.in_flight.take() {
            write.await;
        }
        if let Some(round) = writes.queued.take() {
            self.persist_round(round).await;
        }
        info!(round = controller.round(), "round control stopped");
        Ok(controller.snapshot())
    }

    /// Apply one operator action. Returns a commit to send for a manual submit.
    fn handle_command(
        &self,
        controller: &mut RoundController,
        command: OperatorCommand,
        server_second: u8,
    ) -> Option<CommitRequest> {
        match command {
            OperatorCommand::Select(number) => {
                match controller.select_number(number, server_second) {
                    Ok(()) => self.emit(ControlEvent::Selected { number }),
                    Err(e) => self.warn(e.to_string()),
                }
                None
            }
            OperatorCommand::ToggleMode => {
                let mode = controller.toggle_mode();
                info!(%mode, "mode switched");
                self.emit(ControlEvent::ModeChanged { mode });
                None
            }
            OperatorCommand::Submit => match controller.submit_manual(server_second) {
                Ok(request) => {
                    info!(number = request.number, "manual commit");
                    Some(request)
                }
                Err(e) => {
                    self.warn(e.to_string());
                    None
                }
            },
            OperatorCommand::Quit => None,
        }
    }

    fn start_commit(&self, request: CommitRequest) -> CommitFuture<'a> {
        self.emit(ControlEvent::CommitStarted {
            number: request.number,
        });
        let transport = self.transport;
        async move {
            let result = transport.submit_winning_number(request.number).await;
            (request, result)
        }
        .boxed_local()
    }

    fn finish_commit(
        &self,
        controller: &mut RoundController,
        request: CommitRequest,
        result: Result<u8>,
    ) {
        let outcome = match result {
            Ok(number) => Ok(number),
            Err(RoundCtlError::Rejected(message)) => Err(message),
            Err(e) => {
                warn!(error = %e, "commit request failed");
                Err(MSG_COMMIT_FAILED.to_string())
            }
        };

        if !controller.apply_commit_result(request.ticket, outcome) {
            return;
        }

        match (controller.latest_winning_number(), controller.last_error()) {
            (_, Some(message)) => {
                let message = message.to_string();
                warn!(number = request.number, %message, "winning number rejected");
                self.emit(ControlEvent::CommitFailed { message });
            }
            (Some(number), None) => {
                info!(number, "winning number recorded");
                self.emit(ControlEvent::CommitSucceeded { number });
            }
            (None, None) => {}
        }
    }

    /// Start writing `round`, or queue it behind the write already running.
    fn queue_round_write(&self, writes: &mut RoundWrites<'a>, round: u64) {
        if writes.in_flight.is_some() {
            writes.queued = Some(round);
        } else {
            writes.in_flight = Some(self.persist_round(round).boxed_local());
        }
    }

    fn persist_round(&self, round: u64) -> impl Future<Output = ()> + 'a {
        let storage = self.storage;
        async move {
            if let Err(e) = save_round(storage, round).await {
                warn!(round, error = %e, "failed to persist round counter");
            }
        }
    }

    fn warn(&self, message: String) {
        warn!(%message, "operator action rejected");
        self.emit(ControlEvent::Warning(message));
    }

    fn emit(&self, event: ControlEvent) {
        // A closed panel is not an error for the timer.
        let _ = self.events.send(event);
    }
}

/// Fetch the server time and pair it with the local clock at receipt.
async fn sample_offset<C: Clock, T: GameTransport>(clock: &C, transport: &T) -> Result<ClockOffset> {
    let server_millis = transport.fetch_server_time().await?;
    let local_millis = clock.now_millis()?;
    let offset = ClockOffset::from_samples(server_millis, local_millis);
    debug!(offset_ms = offset.millis(), "server clock offset sampled");
    Ok(offset)
}

/// Resolve the future in `slot`, or never if the slot is empty.
async fn next_pending<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn next_resync(resync: &mut Option<Interval>) {
    match resync {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
