//! Per-domain fetch-method learning.
//!
//! The executor remembers which strategy worked for each host and tries it
//! first next time. Success rates are tracked as an exponential moving
//! average; a host whose preferred method keeps failing while the other one
//! succeeds eventually switches preference.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// How long a learned preference stays valid.
const RECORD_VALIDITY: Duration = Duration::from_secs(86_400);

/// EMA weight for new outcomes on the tracked method.
const EMA_ALPHA: f64 = 0.1;

/// Decay applied to the tracked rate when the other method succeeds.
const CROSS_METHOD_DECAY: f64 = 0.7;

/// Below this rate the table switches the preferred method.
const SWITCH_THRESHOLD: f64 = 0.5;

/// Rate a freshly switched method starts at.
const RESET_RATE: f64 = 0.7;

/// Hosts that serve JS-rendered shells to plain HTTP clients. These start
/// with the scripted strategy instead of learning it the slow way.
const JS_HEAVY_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "linkedin.com",
    "instagram.com",
    "facebook.com",
    "medium.com",
    "stackoverflow.com",
];

/// A fetch strategy the executor can apply to a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// Plain HTTP GET through reqwest.
    Lightweight,
    /// Headless-browser navigation for JS-rendered pages.
    Scripted,
}

impl FetchMethod {
    fn other(self) -> Self {
        match self {
            Self::Lightweight => Self::Scripted,
            Self::Scripted => Self::Lightweight,
        }
    }
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Lightweight => "lightweight",
            Self::Scripted => "scripted",
        })
    }
}

struct DomainRecord {
    method: FetchMethod,
    success_rate: f64,
    recorded_at: Instant,
}

/// Learned per-host method preferences plus politeness bookkeeping.
pub struct DomainTable {
    records: Mutex<HashMap<String, DomainRecord>>,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl Default for DomainTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainTable {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            last_request: Mutex::new(HashMap::new()),
        }
    }

    /// Strategy order for a host: the remembered preference first when a
    /// valid record exists, the JS-heavy preset for known SPA hosts,
    /// otherwise lightweight first.
    pub fn strategy_order(&self, domain: &str) -> [FetchMethod; 2] {
        let records = self.records.lock().expect("domain mutex poisoned");

        if let Some(record) = records.get(domain)
            && record.recorded_at.elapsed() < RECORD_VALIDITY
        {
            return [record.method, record.method.other()];
        }

        if is_js_heavy(domain) {
            [FetchMethod::Scripted, FetchMethod::Lightweight]
        } else {
            [FetchMethod::Lightweight, FetchMethod::Scripted]
        }
    }

    /// Record a terminal fetch outcome for `method` on `domain`.
    ///
    /// Outcomes for the tracked method move its EMA; a success via the
    /// other method decays the tracked rate and, once it drops below the
    /// switch threshold, flips the preference.
    pub fn record_outcome(&self, domain: &str, method: FetchMethod, success: bool) {
        let mut records = self.records.lock().expect("domain mutex poisoned");
        let now = Instant::now();

        let record = records.entry(domain.to_string()).or_insert(DomainRecord {
            method,
            success_rate: if success { 1.0 } else { 0.0 },
            recorded_at: now,
        });

        if record.method == method {
            let outcome = if success { 1.0 } else { 0.0 };
            record.success_rate = (1.0 - EMA_ALPHA) * record.success_rate + EMA_ALPHA * outcome;
        } else if success {
            record.success_rate *= CROSS_METHOD_DECAY;
            if record.success_rate < SWITCH_THRESHOLD {
                debug!(domain, from = %record.method, to = %method, "domain method switch");
                record.method = method;
                record.success_rate = RESET_RATE;
            }
        }
        record.recorded_at = now;
    }

    /// How long to wait before the next request to `domain`, given the
    /// configured politeness delay. Updates the last-request timestamp.
    pub fn politeness_wait(&self, domain: &str, delay: Duration) -> Duration {
        let mut last = self.last_request.lock().expect("domain mutex poisoned");
        let now = Instant::now();

        let wait = match last.get(domain) {
            Some(&prev) => delay.saturating_sub(now.duration_since(prev)),
            None => Duration::ZERO,
        };
        last.insert(domain.to_string(), now + wait);
        wait
    }
}

/// Whether a host (or any of its subdomains) is on the JS-heavy preset list.
pub fn is_js_heavy(domain: &str) -> bool {
    JS_HEAVY_DOMAINS
        .iter()
        .any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}
