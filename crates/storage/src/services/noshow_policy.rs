use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::str::FromStr;

use crate::models::{Member, MembershipStatus};

/// Which no-shows count towards the block threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoShowWindow {
    /// From the first day of the current calendar month (UTC).
    #[default]
    CalendarMonth,
    /// The 30 days leading up to now.
    Rolling30Days,
}

impl NoShowWindow {
    /// Earliest instant whose no-shows still count at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::CalendarMonth => {
                let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                    .unwrap_or_else(|| now.date_naive());
                first.and_time(NaiveTime::MIN).and_utc()
            }
            Self::Rolling30Days => now - Duration::days(30),
        }
    }
}

impl FromStr for NoShowWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar_month" | "calendar" | "month" => Ok(Self::CalendarMonth),
            "rolling_30_days" | "rolling" => Ok(Self::Rolling30Days),
            other => Err(format!("unknown no-show window '{}'", other)),
        }
    }
}

/// Tunable thresholds of the booking core.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// No-shows inside the window that trigger a block.
    pub noshow_limit: u32,
    pub block_duration: Duration,
    pub noshow_window: NoShowWindow,
    /// Members cannot cancel later than this before the class starts.
    pub cancellation_notice: Duration,
    /// Upper bound on waiting for a class lock.
    pub lock_timeout: std::time::Duration,
    /// How long a cancelled or completed class stays in memory after its
    /// date. Older classes are served from the store.
    pub archive_after: Duration,
}

impl BookingPolicy {
    /// Closed classes dated before this day are archived.
    pub fn archive_cutoff(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - self.archive_after).date_naive()
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            noshow_limit: 3,
            block_duration: Duration::days(30),
            noshow_window: NoShowWindow::CalendarMonth,
            cancellation_notice: Duration::minutes(60),
            lock_timeout: std::time::Duration::from_secs(5),
            archive_after: Duration::days(30),
        }
    }
}

/// What recording a no-show did to the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyDecision {
    pub monthly_noshows: u32,
    pub total_noshow: i32,
    /// Set when this no-show placed (or extended) a block.
    pub blocked_until: Option<DateTime<Utc>>,
    /// The member is exactly one no-show away from a block.
    pub warn: bool,
}

/// Applies one no-show to `member` at `now`.
///
/// The lifetime counter always grows. The windowed count drops entries that
/// fell out of the window and blocks the member once it reaches the limit.
pub fn record_noshow(
    member: &mut Member,
    now: DateTime<Utc>,
    policy: &BookingPolicy,
) -> PenaltyDecision {
    member.total_noshow += 1;
    member.recent_noshows.push(now);

    let since = policy.noshow_window.window_start(now);
    member.recent_noshows.retain(|at| *at >= since);
    let monthly_noshows = member.recent_noshows.len() as u32;

    let blocked_until = if monthly_noshows >= policy.noshow_limit {
        let until = now + policy.block_duration;
        member.blocked_until = Some(until);
        member.membership_status = MembershipStatus::Suspended;
        Some(until)
    } else {
        None
    };

    PenaltyDecision {
        monthly_noshows,
        total_noshow: member.total_noshow,
        blocked_until,
        warn: blocked_until.is_none() && monthly_noshows + 1 == policy.noshow_limit,
    }
}

/// Checks that `member` may take a new seat or waitlist spot at `now`.
pub fn ensure_can_book(member: &Member, now: DateTime<Utc>) -> crate::error::BookingResult<()> {
    if let Some(until) = member.blocked_until
        && now < until
    {
        return Err(crate::error::BookingError::MemberBlocked { until });
    }

    match member.effective_status(now) {
        MembershipStatus::Active => Ok(()),
        status => Err(crate::error::BookingError::MembershipInactive { status }),
    }
}
