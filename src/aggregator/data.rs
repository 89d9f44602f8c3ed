//! Fan-in of hotel descriptions for one list request.

use crate::framework::{Actor, Context};
use crate::messages::{respond, DataMessage, Reply, Status};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Collects one description per hotel, reports the joined text once, then stops.
///
/// The expected count and the descriptions may arrive in any order.
#[derive(Default)]
pub struct DataAggregator {
    expected: Option<usize>,
    report_to: Option<Reply>,
    received: usize,
    blocks: Vec<String>,
}

impl DataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_report(&mut self, ctx: &mut Context<DataMessage>) {
        if self.expected != Some(self.received) {
            return;
        }
        let Some(report_to) = self.report_to.take() else {
            return;
        };
        let status = if self.blocks.is_empty() {
            Status::NoHotels
        } else {
            Status::HotelReport(self.blocks.join("\n\n"))
        };
        debug!(hotels = self.blocks.len(), "Hotel report complete");
        respond(report_to, Ok(status));
        ctx.stop();
    }
}

#[async_trait]
impl Actor for DataAggregator {
    type Message = DataMessage;

    async fn handle(&mut self, msg: DataMessage, ctx: &mut Context<DataMessage>) {
        match msg {
            DataMessage::Expect { hotels, report_to } => {
                if self.report_to.is_some() || self.expected.is_some() {
                    warn!(aggregator = %ctx.name(), "Duplicate expectation ignored");
                    return;
                }
                self.expected = Some(hotels);
                self.report_to = Some(report_to);
            }
            DataMessage::Description(block) => {
                self.received += 1;
                self.blocks.push(block);
            }
            DataMessage::Gone => self.received += 1,
        }
        self.try_report(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{spawn, Addr};
    use tokio::sync::oneshot;

    fn expect(
        aggregator: &Addr<DataMessage>,
        hotels: usize,
    ) -> oneshot::Receiver<Result<Status, crate::error::RentError>> {
        let (report_to, report) = oneshot::channel();
        aggregator
            .tell(DataMessage::Expect { hotels, report_to })
            .unwrap();
        report
    }

    #[tokio::test]
    async fn test_zero_hotels_reports_placeholder() {
        let aggregator = spawn("data", DataAggregator::new());
        let report = expect(&aggregator, 0);
        assert_eq!(report.await.unwrap(), Ok(Status::NoHotels));
        aggregator.closed().await;
    }

    #[tokio::test]
    async fn test_replies_before_expectation_are_counted() {
        let aggregator = spawn("data", DataAggregator::new());
        aggregator
            .tell(DataMessage::Description("first".into()))
            .unwrap();
        aggregator
            .tell(DataMessage::Description("second".into()))
            .unwrap();
        let report = expect(&aggregator, 3);
        aggregator
            .tell(DataMessage::Description("third".into()))
            .unwrap();

        assert_eq!(
            report.await.unwrap(),
            Ok(Status::HotelReport("first\n\nsecond\n\nthird".into()))
        );
    }

    #[tokio::test]
    async fn test_gone_hotels_count_without_a_block() {
        let aggregator = spawn("data", DataAggregator::new());
        let report = expect(&aggregator, 2);
        aggregator.tell(DataMessage::Gone).unwrap();
        aggregator
            .tell(DataMessage::Description("only".into()))
            .unwrap();
        assert_eq!(report.await.unwrap(), Ok(Status::HotelReport("only".into())));
    }

    #[tokio::test]
    async fn test_all_gone_reports_placeholder() {
        let aggregator = spawn("data", DataAggregator::new());
        let report = expect(&aggregator, 1);
        aggregator.tell(DataMessage::Gone).unwrap();
        assert_eq!(report.await.unwrap(), Ok(Status::NoHotels));
    }
}
