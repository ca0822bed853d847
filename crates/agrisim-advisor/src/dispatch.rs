//! Tick-side bridge to the asynchronous advisor.
//!
//! The tick loop never awaits. It submits a crop snapshot and either gets a
//! cached report back immediately or a promise that the report will show up
//! in a later [`AdvisoryDispatcher::drain`]. Results for crops cancelled in
//! the meantime are reported as discarded and never applied. Harvest yield
//! refreshes come back through the same drain as plain text.

use std::collections::HashSet;

use agrisim_types::{AdvisoryReport, CropId, CropKind, EnvironmentState, ReportSource};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::advisor::Advisor;
use crate::subject::AdvisorySubject;

/// Outcome of submitting a crop for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Report available now (cache hit or offline heuristics).
    Ready(AdvisoryReport),
    /// A request is running; the report arrives through `drain`.
    Pending,
}

/// A finished background analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Report for a crop that is still wanted.
    Report {
        /// Crop the report belongs to.
        crop: CropId,
        /// The report.
        report: AdvisoryReport,
    },
    /// Report for a crop that was cancelled while the request ran.
    Discarded {
        /// Crop the stale report belonged to.
        crop: CropId,
    },
    /// Refreshed yield text for a harvested crop.
    Yield {
        /// Harvested crop.
        crop: CropId,
        /// Yield prediction from the refreshed report.
        text: String,
        /// Origin of the refreshed report.
        source: ReportSource,
    },
}

/// What a background task sends back.
#[derive(Debug)]
enum Arrival {
    Analysis(CropId, AdvisoryReport),
    Yield(CropId, AdvisoryReport),
}

/// Submits analyses from the tick thread and collects their results.
#[derive(Debug)]
pub struct AdvisoryDispatcher {
    advisor: Advisor,
    runtime: Option<Handle>,
    tx: mpsc::UnboundedSender<Arrival>,
    rx: mpsc::UnboundedReceiver<Arrival>,
    pending: HashSet<CropId>,
}

impl AdvisoryDispatcher {
    /// Use the ambient Tokio runtime if there is one. Without a runtime
    /// every submission is answered synchronously from the heuristics.
    pub fn new(advisor: Advisor) -> Self {
        Self::with_runtime(advisor, Handle::try_current().ok())
    }

    /// Spawn requests on an explicit runtime (or none).
    pub fn with_runtime(advisor: Advisor, runtime: Option<Handle>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            advisor,
            runtime,
            tx,
            rx,
            pending: HashSet::new(),
        }
    }

    /// The advisor behind this dispatcher.
    pub const fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    /// Number of crops with a request outstanding.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `crop` has a request outstanding.
    pub fn is_pending(&self, crop: CropId) -> bool {
        self.pending.contains(&crop)
    }

    /// Ask for a report on `subject` without blocking.
    pub fn submit(&mut self, subject: AdvisorySubject) -> Submission {
        let crop = subject.crop;
        if let Some(report) = self.advisor.cached(&subject.fingerprint()) {
            debug!(crop_id = %crop, "advisory cache hit");
            return Submission::Ready(report);
        }
        if self.pending.contains(&crop) {
            return Submission::Pending;
        }

        let runtime = match &self.runtime {
            Some(runtime) if self.advisor.is_enabled() => runtime,
            _ => return Submission::Ready(self.advisor.analyze_offline(&subject)),
        };

        let advisor = self.advisor.clone();
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let report = advisor.analyze(subject).await;
            // The receiver only goes away with the dispatcher itself.
            let _ = tx.send(Arrival::Analysis(crop, report));
        });
        self.pending.insert(crop);
        debug!(crop_id = %crop, "advisory request dispatched");
        Submission::Pending
    }

    /// Stop waiting for `crop`. Its eventual result is discarded.
    pub fn cancel(&mut self, crop: CropId) -> bool {
        self.pending.remove(&crop)
    }

    /// Refresh the yield text for a crop being harvested, from its
    /// pre-harvest `subject`. The text arrives as [`Delivery::Yield`] and is
    /// not tied to the crop's pending analysis. Returns whether a refresh
    /// was started; without a runtime or service there is nothing to
    /// refresh beyond the synchronous text.
    pub fn refresh_yield(&self, subject: AdvisorySubject) -> bool {
        let runtime = match &self.runtime {
            Some(runtime) if self.advisor.is_enabled() => runtime,
            _ => return false,
        };
        let crop = subject.crop;
        let advisor = self.advisor.clone();
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let report = advisor.analyze(subject).await;
            let _ = tx.send(Arrival::Yield(crop, report));
        });
        debug!(crop_id = %crop, "harvest yield refresh dispatched");
        true
    }

    /// Collect every result that has arrived since the last call.
    pub fn drain(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        while let Ok(arrival) = self.rx.try_recv() {
            match arrival {
                Arrival::Analysis(crop, report) => {
                    if self.pending.remove(&crop) {
                        deliveries.push(Delivery::Report { crop, report });
                    } else {
                        debug!(crop_id = %crop, "discarding advisory result for cancelled crop");
                        deliveries.push(Delivery::Discarded { crop });
                    }
                }
                Arrival::Yield(crop, report) => deliveries.push(Delivery::Yield {
                    crop,
                    text: report.yield_prediction,
                    source: report.source,
                }),
            }
        }
        deliveries
    }

    /// Start the one-time genetic-variation hint request for `kind` if the
    /// service is connected and none was made yet. Returns whether a
    /// request was started.
    pub fn request_variation(&self, kind: CropKind, environment: EnvironmentState) -> bool {
        let Some(runtime) = &self.runtime else {
            return false;
        };
        if !self.advisor.claim_variation_request(kind) {
            return false;
        }
        let advisor = self.advisor.clone();
        runtime.spawn(async move {
            let _ = advisor.fetch_variation_hint(kind, environment).await;
        });
        true
    }
}
