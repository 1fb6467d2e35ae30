//! Freshness decisions for cached entries.
//!
//! [`FreshnessPolicy::decide`] is a pure function of the cached entry, the
//! caller's requirement and the current time. Age and remote metadata are
//! checked independently; failing either makes the entry stale.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};

use super::entry::{CachedExternalResource, ExternalResourceMetaData};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What the caller knows about the remote copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RemoteCheck {
    /// Do not compare against the remote.
    #[default]
    Skip,
    /// The remote must be consulted but has not been probed yet.
    Required,
    /// Metadata the caller just observed remotely.
    Observed(ExternalResourceMetaData),
}

/// Conditions a cached entry must meet to be used without refetching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshnessRequirement {
    /// Maximum age of the entry; `None` accepts any age.
    pub max_age: Option<Duration>,
    /// Remote comparison to perform.
    pub remote: RemoteCheck,
}

impl FreshnessRequirement {
    /// Accept entries of any age.
    pub fn any_age() -> Self {
        Self::default()
    }

    /// Accept entries cached within `max_age`.
    pub fn max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            remote: RemoteCheck::Skip,
        }
    }

    /// Also require the entry to match metadata observed remotely.
    pub fn with_remote(mut self, observed: ExternalResourceMetaData) -> Self {
        self.remote = RemoteCheck::Observed(observed);
        self
    }

    /// Also require a remote check the caller has not done yet.
    pub fn revalidate(mut self) -> Self {
        self.remote = RemoteCheck::Required;
        self
    }
}

/// Outcome of the pure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Entry may be used as is.
    Fresh,
    /// Entry must be refetched.
    Stale,
}

/// Outcome of [`ExternalResourceCache::use_cached`](super::ExternalResourceCache::use_cached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshnessDecision {
    /// The entry satisfies the requirement.
    Fresh(CachedExternalResource),
    /// The entry, if any, must be refetched.
    Stale(Option<CachedExternalResource>),
    /// A remote probe is needed before deciding.
    Unknown(Option<CachedExternalResource>),
}

impl FreshnessDecision {
    /// Whether the entry can be used without touching the network.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// The cached entry the decision was made on, if any.
    pub fn entry(&self) -> Option<&CachedExternalResource> {
        match self {
            Self::Fresh(entry) => Some(entry),
            Self::Stale(entry) | Self::Unknown(entry) => entry.as_ref(),
        }
    }

    /// Consume the decision, returning its entry.
    pub fn into_entry(self) -> Option<CachedExternalResource> {
        match self {
            Self::Fresh(entry) => Some(entry),
            Self::Stale(entry) | Self::Unknown(entry) => entry,
        }
    }
}

/// Pure freshness rules.
pub struct FreshnessPolicy;

impl FreshnessPolicy {
    /// Decide whether `cached` satisfies `requirement` at `now`.
    pub fn decide(
        cached: Option<&CachedExternalResource>,
        requirement: &FreshnessRequirement,
        now: DateTime<Utc>,
    ) -> Freshness {
        let Some(cached) = cached else {
            return Freshness::Stale;
        };

        if let Some(max_age) = requirement.max_age {
            if cached.age(now) > max_age {
                return Freshness::Stale;
            }
        }

        if let RemoteCheck::Observed(observed) = &requirement.remote {
            if !Self::matches_remote(cached, observed) {
                return Freshness::Stale;
            }
        }

        Freshness::Fresh
    }

    /// Whether observed remote metadata agrees with the cached entry.
    ///
    /// Observed metadata means the resource exists, so a negative entry never
    /// matches. Metadata carrying neither a timestamp nor a length gives
    /// nothing to compare and does not match either.
    fn matches_remote(cached: &CachedExternalResource, observed: &ExternalResourceMetaData) -> bool {
        if cached.is_missing() {
            return false;
        }
        if observed.last_modified.is_none() && observed.content_length.is_none() {
            return false;
        }
        if observed.last_modified != cached.external_last_modified() {
            return false;
        }
        match observed.content_length {
            Some(len) => len == cached.content_length(),
            None => true,
        }
    }
}

/// Parse a TTL string like "7d", "24h", "30m" or "45s".
///
/// A bare number is taken as seconds. Negative and out-of-range values are
/// rejected.
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let ttl = ttl.trim().to_lowercase();
    let units: [(char, fn(i64) -> Option<Duration>); 4] = [
        ('d', Duration::try_days),
        ('h', Duration::try_hours),
        ('m', Duration::try_minutes),
        ('s', Duration::try_seconds),
    ];
    let (digits, unit) = units
        .iter()
        .find_map(|&(suffix, unit)| ttl.strip_suffix(suffix).map(|digits| (digits, unit)))
        .unwrap_or((ttl.as_str(), Duration::try_seconds));

    let n: i64 = digits
        .parse()
        .with_context(|| format!("invalid TTL '{}'", ttl))?;
    if n < 0 {
        bail!("TTL '{}' must not be negative", ttl);
    }
    unit(n).ok_or_else(|| anyhow!("TTL '{}' is out of range", ttl))
}

/// Format a duration for display, in its largest whole unit.
///
/// Negative durations display as zero.
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(i64, &str); 3] = [(86_400, "d"), (3_600, "h"), (60, "m")];

    let secs = duration.num_seconds().max(0);
    UNITS
        .iter()
        .find(|(size, _)| secs >= *size)
        .map_or_else(|| format!("{}s", secs), |(size, unit)| format!("{}{}", secs / size, unit))
}
