//! # Reservation Saga
//!
//! One [`ReservationAggregator`] runs per reservation. It holds rooms at several hotels
//! without a distributed lock: either every hotel holds its rooms, or the ones that did
//! are told to release them again.
//!
//! ```text
//! Collecting ──all held──▶ Pending ──Cancel──▶ Cancelling ──▶ Stopped
//!     │                       └─────Confirm──▶ Confirming ──▶ Stopped
//!     └──any failure (compensate)──────────────────────────▶ Stopped
//! ```
//!
//! Whatever path ends the saga, the broker that created it is told exactly once.

use crate::error::RentError;
use crate::framework::{Actor, Addr, Context};
use crate::messages::{respond, BrokerCommand, HotelCommand, Reply, SagaMessage, Status};
use crate::model::{HotelError, HotelId, ReservationId};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub struct ReservationAggregator {
    reservation: ReservationId,
    stage: Stage,
    _notice: StopNotice,
}

enum Stage {
    Collecting(Collecting),
    Pending { hotels: Vec<Addr<HotelCommand>> },
    Cancelling(Settlement),
    Confirming(Settlement),
    Stopped,
}

#[derive(Default)]
struct Collecting {
    expected: Option<usize>,
    report_to: Option<Reply>,
    answers: usize,
    held: Vec<Addr<HotelCommand>>,
    failures: Vec<HotelError>,
}

struct Settlement {
    report_to: Reply,
    outstanding: usize,
    failures: Vec<HotelError>,
}

#[derive(Debug, Clone, Copy)]
enum Decision {
    Cancel,
    Confirm,
}

impl Decision {
    fn command(self, reservation: ReservationId, reply_to: Addr<SagaMessage>) -> HotelCommand {
        match self {
            Self::Cancel => HotelCommand::Cancel {
                reservation,
                reply_to,
            },
            Self::Confirm => HotelCommand::Confirm {
                reservation,
                reply_to,
            },
        }
    }
}

/// Tells the broker the saga is over when dropped, which also covers a panicking handler.
struct StopNotice {
    broker: Addr<BrokerCommand>,
    reservation: ReservationId,
}

impl Drop for StopNotice {
    fn drop(&mut self) {
        let notice = BrokerCommand::AggregatorStopped {
            reservation: self.reservation.clone(),
        };
        if self.broker.tell(notice).is_err() {
            debug!(reservation = %self.reservation, "Broker already stopped");
        }
    }
}

impl ReservationAggregator {
    pub fn new(reservation: ReservationId, broker: Addr<BrokerCommand>) -> Self {
        Self {
            _notice: StopNotice {
                broker,
                reservation: reservation.clone(),
            },
            reservation,
            stage: Stage::Collecting(Collecting::default()),
        }
    }

    /// Asks `hotel` to give back rooms held for this reservation. Nobody waits for the answer.
    fn release(&self, hotel: &Addr<HotelCommand>, ctx: &Context<SagaMessage>) {
        let command = Decision::Cancel.command(self.reservation.clone(), ctx.addr().clone());
        if hotel.tell(command).is_err() {
            debug!(
                reservation = %self.reservation,
                hotel = %hotel.name(),
                "Hotel gone, nothing to release"
            );
        }
    }

    fn begin(&mut self, decision: Decision, reply_to: Reply, ctx: &Context<SagaMessage>) {
        let hotels = match std::mem::replace(&mut self.stage, Stage::Stopped) {
            Stage::Pending { hotels } => hotels,
            other => {
                self.stage = other;
                warn!(reservation = %self.reservation, ?decision, "Reservation is not pending");
                respond(
                    reply_to,
                    Err(RentError::ReservationBusy(self.reservation.clone())),
                );
                return;
            }
        };

        let mut settlement = Settlement {
            report_to: reply_to,
            outstanding: 0,
            failures: Vec::new(),
        };
        for hotel in &hotels {
            match hotel.tell(decision.command(self.reservation.clone(), ctx.addr().clone())) {
                Ok(()) => settlement.outstanding += 1,
                Err(_) => settlement.failures.push(HotelError::HotelGone {
                    hotel: HotelId::from(hotel.name()),
                }),
            }
        }
        info!(
            reservation = %self.reservation,
            ?decision,
            hotels = hotels.len(),
            "Settling reservation"
        );
        self.stage = match decision {
            Decision::Cancel => Stage::Cancelling(settlement),
            Decision::Confirm => Stage::Confirming(settlement),
        };
    }

    /// Moves to the next stage once the current one has all its answers. Safe to call
    /// after every message.
    fn advance(&mut self, ctx: &mut Context<SagaMessage>) {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Stopped) {
            Stage::Collecting(collecting) => self.conclude_collecting(collecting, ctx),
            Stage::Cancelling(settlement) if settlement.outstanding == 0 => {
                self.conclude_settlement(settlement, Decision::Cancel, ctx)
            }
            Stage::Confirming(settlement) if settlement.outstanding == 0 => {
                self.conclude_settlement(settlement, Decision::Confirm, ctx)
            }
            unchanged => unchanged,
        };
    }

    fn conclude_collecting(&self, collecting: Collecting, ctx: &mut Context<SagaMessage>) -> Stage {
        let Collecting {
            expected,
            report_to,
            answers,
            held,
            failures,
        } = collecting;
        match (expected, report_to) {
            (Some(expected), Some(report_to)) if answers == expected => {
                if failures.is_empty() {
                    info!(
                        reservation = %self.reservation,
                        hotels = held.len(),
                        "Reservation pending"
                    );
                    respond(
                        report_to,
                        Ok(Status::ReservationPlaced(self.reservation.clone())),
                    );
                    return Stage::Pending { hotels: held };
                }
                for hotel in &held {
                    self.release(hotel, ctx);
                }
                warn!(
                    reservation = %self.reservation,
                    failed = failures.len(),
                    compensated = held.len(),
                    "Reservation failed"
                );
                respond(report_to, Err(RentError::ReservationFailed(failures)));
                ctx.stop();
                Stage::Stopped
            }
            (expected, report_to) => Stage::Collecting(Collecting {
                expected,
                report_to,
                answers,
                held,
                failures,
            }),
        }
    }

    fn conclude_settlement(
        &self,
        settlement: Settlement,
        decision: Decision,
        ctx: &mut Context<SagaMessage>,
    ) -> Stage {
        let Settlement {
            report_to,
            failures,
            ..
        } = settlement;
        let id = self.reservation.clone();
        let outcome = match (decision, failures.is_empty()) {
            (Decision::Cancel, true) => Ok(Status::ReservationCancelled(id)),
            (Decision::Confirm, true) => Ok(Status::ReservationConfirmed(id)),
            (Decision::Cancel, false) => Err(RentError::CancellationFailed(failures)),
            (Decision::Confirm, false) => Err(RentError::ConfirmationFailed(failures)),
        };
        match &outcome {
            Ok(_) => info!(reservation = %self.reservation, ?decision, "Reservation settled"),
            Err(err) => warn!(
                reservation = %self.reservation,
                ?decision,
                error = %err,
                "Reservation settled with failures"
            ),
        }
        respond(report_to, outcome);
        ctx.stop();
        Stage::Stopped
    }
}

#[async_trait]
impl Actor for ReservationAggregator {
    type Message = SagaMessage;

    async fn handle(&mut self, msg: SagaMessage, ctx: &mut Context<SagaMessage>) {
        match msg {
            SagaMessage::Expect { hotels, report_to } => match &mut self.stage {
                Stage::Collecting(collecting) if collecting.report_to.is_none() => {
                    collecting.expected = Some(hotels);
                    collecting.report_to = Some(report_to);
                }
                _ => respond(
                    report_to,
                    Err(RentError::ReservationBusy(self.reservation.clone())),
                ),
            },
            SagaMessage::Reserved { hotel, result } => match &mut self.stage {
                Stage::Collecting(collecting) => {
                    collecting.answers += 1;
                    match result {
                        Ok(_) => collecting.held.push(hotel),
                        Err(err) => collecting.failures.push(err),
                    }
                }
                _ => {
                    if result.is_ok() {
                        warn!(
                            reservation = %self.reservation,
                            hotel = %hotel.name(),
                            "Late hold, releasing rooms"
                        );
                        self.release(&hotel, ctx);
                    }
                }
            },
            SagaMessage::Cancel { reply_to } => self.begin(Decision::Cancel, reply_to, ctx),
            SagaMessage::Confirm { reply_to } => self.begin(Decision::Confirm, reply_to, ctx),
            SagaMessage::Settled { hotel, result } => match &mut self.stage {
                Stage::Cancelling(settlement) | Stage::Confirming(settlement) => {
                    settlement.outstanding = settlement.outstanding.saturating_sub(1);
                    if let Err(err) = result {
                        settlement.failures.push(err);
                    }
                }
                _ => debug!(
                    reservation = %self.reservation,
                    %hotel,
                    "Settlement outside of settling ignored"
                ),
            },
            SagaMessage::Shutdown => {
                info!(reservation = %self.reservation, "Reservation aggregator shutting down");
                self.stage = Stage::Stopped;
                ctx.stop();
                return;
            }
        }
        self.advance(ctx);
    }

    fn undelivered(&mut self, msg: SagaMessage, ctx: &Context<SagaMessage>) {
        let gone = || RentError::UnknownReservation(self.reservation.clone());
        match msg {
            SagaMessage::Expect { report_to, .. } => respond(report_to, Err(gone())),
            SagaMessage::Cancel { reply_to } | SagaMessage::Confirm { reply_to } => {
                respond(reply_to, Err(gone()))
            }
            SagaMessage::Reserved {
                hotel,
                result: Ok(_),
            } => self.release(&hotel, ctx),
            SagaMessage::Reserved { .. } | SagaMessage::Settled { .. } | SagaMessage::Shutdown => {}
        }
    }

    async fn stopped(&mut self, _ctx: &mut Context<SagaMessage>) {
        debug!(reservation = %self.reservation, "Reservation aggregator stopped");
    }
}
