//! Link health polling with optional recovery

use readout_control::{ReadoutController, SequenceOutcome};
use readout_core::RegisterAccess;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// Stop after this many polls; `None` polls forever
    pub polls: Option<usize>,
    /// Reset and reactivate when a poll finds the link down
    pub recover: bool,
}

/// Counts gathered over a monitor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub polls: usize,
    pub healthy: usize,
    pub recoveries: usize,
    pub last_frame: Option<u64>,
}

/// Poll link health at a fixed interval
pub fn run<A: RegisterAccess>(
    controller: &mut ReadoutController<A>,
    config: &MonitorConfig,
) -> MonitorReport {
    let mut report = MonitorReport::default();

    loop {
        poll_once(controller, config.recover, &mut report);

        if config.polls.is_some_and(|n| report.polls >= n) {
            break;
        }
        thread::sleep(config.interval);
    }

    info!(
        polls = report.polls,
        healthy = report.healthy,
        recoveries = report.recoveries,
        "Monitor finished"
    );
    report
}

fn poll_once<A: RegisterAccess>(
    controller: &mut ReadoutController<A>,
    recover: bool,
    report: &mut MonitorReport,
) {
    report.polls += 1;

    match controller.frame_number() {
        Ok(frame) => report.last_frame = Some(frame),
        Err(e) => warn!(error = %e, "Frame number read failed"),
    }

    let healthy = match controller.link_status() {
        Ok(status) if status.is_healthy() => {
            info!(frame = ?report.last_frame, "Readout running");
            true
        }
        Ok(status) => {
            warn!(
                aurora_lane = status.aurora_lane,
                aurora_channel = status.aurora_channel,
                cmac_0 = status.cmac_0,
                cmac_1 = status.cmac_1,
                "Readout link down"
            );
            false
        }
        Err(e) => {
            warn!(error = %e, "Health read failed");
            false
        }
    };

    if healthy {
        report.healthy += 1;
    } else if recover {
        recover_link(controller);
        report.recoveries += 1;
    }
}

fn recover_link<A: RegisterAccess>(controller: &mut ReadoutController<A>) {
    info!("Attempting readout recovery");
    if let SequenceOutcome::AttemptedWithWarnings { step, .. } = controller.reset() {
        warn!(step = %step, "Reset incomplete, reactivating anyway");
    }
    if let SequenceOutcome::AttemptedWithWarnings { step, .. } = controller.reactivate() {
        warn!(step = %step, "Reactivate incomplete");
    }
}
