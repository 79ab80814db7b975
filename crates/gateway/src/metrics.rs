//! Gateway counters and timings, recorded through the `metrics` facade.
//!
//! Nothing is exported unless the host installs a recorder (the server
//! installs the Prometheus one).

use metrics::{counter, histogram};
use std::time::Duration;

use crate::GatewayError;

pub const SUBMIT_TOTAL: &str = "wmgate_submit_total";
pub const RELAY_TOTAL: &str = "wmgate_relay_total";
pub const UPSTREAM_SECONDS: &str = "wmgate_upstream_call_seconds";
pub const PROBE_TOTAL: &str = "wmgate_probe_total";

pub(crate) fn record_submit(result: Result<(), &GatewayError>) {
    let outcome = match result {
        Ok(()) => "ok",
        Err(err) => err.code(),
    };
    counter!(SUBMIT_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_relay(result: Result<&'static str, &GatewayError>) {
    let outcome = match result {
        Ok(persistence) => persistence,
        Err(err) => err.code(),
    };
    counter!(RELAY_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_upstream(operation: &'static str, elapsed: Duration) {
    histogram!(UPSTREAM_SECONDS, "operation" => operation).record(elapsed.as_secs_f64());
}

pub(crate) fn record_probe(ok: bool) {
    counter!(PROBE_TOTAL, "outcome" => if ok { "ok" } else { "failed" }).increment(1);
}
