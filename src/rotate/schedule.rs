// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use jiff::Timestamp;
use jiff::Zoned;

use super::manager::Inner;
use crate::Error;

const THREAD_NAME: &str = "rotalog-scheduler";

/// Returns the first multiple of `interval` strictly after `now`.
///
/// Multiples are counted from the Unix epoch on the wall clock of `now`'s time zone, so a
/// 24 hour interval lands on midnight of that zone and a 1 hour interval on the full hour,
/// whatever the start time. The zone's offset at `now` is used for the whole step.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use std::time::Duration;
///
/// use jiff::Timestamp;
/// use jiff::Zoned;
/// use rotalog::rotate::next_rotation;
///
/// let now = Zoned::from_str("2024-08-10T17:12:52[UTC]").unwrap();
/// let next = next_rotation(&now, Duration::from_secs(24 * 60 * 60));
/// assert_eq!(next, Timestamp::from_str("2024-08-11T00:00:00Z").unwrap());
/// ```
pub fn next_rotation(now: &Zoned, interval: Duration) -> Timestamp {
    let interval = i128::try_from(interval.as_nanos())
        .unwrap_or(i128::MAX)
        .max(1);
    let offset = i128::from(now.offset().seconds()) * 1_000_000_000;
    let wall = now.timestamp().as_nanosecond() + offset;

    let next = wall
        .checked_add(interval)
        .map(|advanced| advanced - advanced.rem_euclid(interval) - offset);
    next.and_then(|next| Timestamp::from_nanosecond(next).ok())
        .unwrap_or(Timestamp::MAX)
}

fn wait_until(now: Timestamp, target: Timestamp) -> Duration {
    let nanos = target.as_nanosecond() - now.as_nanosecond();
    Duration::from_nanos(u64::try_from(nanos.max(0)).unwrap_or(u64::MAX))
}

pub(super) fn spawn(inner: Arc<Inner>, shutdown: Receiver<()>) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(&inner, &shutdown))
}

fn run(inner: &Inner, shutdown: &Receiver<()>) {
    let config = inner.config();
    let mut target: Option<Timestamp> = None;

    loop {
        let now = Timestamp::now();
        // waking up before the target must not fire the same boundary twice
        let base = match target {
            Some(target) if target > now => target,
            _ => now,
        };
        let next = next_rotation(
            &base.to_zoned(config.timezone.clone()),
            config.rotation_interval,
        );
        target = Some(next);

        match shutdown.recv_timeout(wait_until(now, next)) {
            Err(RecvTimeoutError::Timeout) => {
                // the wall clock may lag the monotonic wait
                let at = Timestamp::now().max(next);
                match inner.rotate_at(at) {
                    Ok(()) => {}
                    Err(Error::Stopped) => break,
                    Err(err) => inner.report_failure(&err),
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use jiff::tz::TimeZone;
    use rand::Rng;

    use super::*;

    const HOUR: u64 = 60 * 60;
    const DAY: u64 = 24 * HOUR;

    fn utc(s: &str) -> Zoned {
        Zoned::from_str(s).unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::from_str(s).unwrap()
    }

    #[test]
    fn test_next_rotation() {
        let now = utc("2024-08-10T17:12:52[UTC]");

        assert_eq!(
            next_rotation(&now, Duration::from_secs(60)),
            ts("2024-08-10T17:13:00Z")
        );
        assert_eq!(
            next_rotation(&now, Duration::from_secs(HOUR)),
            ts("2024-08-10T18:00:00Z")
        );
        assert_eq!(
            next_rotation(&now, Duration::from_secs(DAY)),
            ts("2024-08-11T00:00:00Z")
        );
        assert_eq!(
            next_rotation(&now, Duration::from_secs(6 * HOUR)),
            ts("2024-08-10T18:00:00Z")
        );
    }

    #[test]
    fn test_next_rotation_on_a_boundary_moves_a_full_interval() {
        let now = utc("2024-08-11T00:00:00[UTC]");
        assert_eq!(
            next_rotation(&now, Duration::from_secs(DAY)),
            ts("2024-08-12T00:00:00Z")
        );
    }

    #[test]
    fn test_next_rotation_follows_zone_midnight() {
        let now = Zoned::from_str("2024-08-10T17:12:52+08:00[+08:00]").unwrap();
        assert_eq!(
            next_rotation(&now, Duration::from_secs(DAY)),
            ts("2024-08-10T16:00:00Z")
        );

        let now = now.with_time_zone(TimeZone::fixed(jiff::tz::offset(-5)));
        assert_eq!(
            next_rotation(&now, Duration::from_secs(DAY)),
            ts("2024-08-11T05:00:00Z")
        );
    }

    #[test]
    fn test_consecutive_rotations_are_aligned_and_one_interval_apart() {
        let mut rng = rand::rng();
        let intervals = [
            Duration::from_millis(250),
            Duration::from_secs(1),
            Duration::from_secs(90),
            Duration::from_secs(HOUR),
            Duration::from_secs(DAY),
            Duration::from_secs(7 * DAY),
        ];

        for interval in intervals {
            let nanos = i128::try_from(interval.as_nanos()).unwrap();
            for _ in 0..100 {
                let seconds = rng.random_range(0..4_000_000_000i64);
                let now = Timestamp::from_second(seconds)
                    .unwrap()
                    .to_zoned(TimeZone::UTC);

                let first = next_rotation(&now, interval);
                let second = next_rotation(&first.to_zoned(TimeZone::UTC), interval);

                assert!(first > now.timestamp());
                assert_eq!(second.as_nanosecond() - first.as_nanosecond(), nanos);
                assert_eq!(first.as_nanosecond().rem_euclid(nanos), 0);
                assert_eq!(second.as_nanosecond().rem_euclid(nanos), 0);
            }
        }
    }

    #[test]
    fn test_wait_until() {
        let now = ts("2024-08-10T17:12:52Z");
        assert_eq!(
            wait_until(now, ts("2024-08-10T17:13:00Z")),
            Duration::from_secs(8)
        );
        assert_eq!(wait_until(now, ts("2024-08-10T17:00:00Z")), Duration::ZERO);
    }
}
