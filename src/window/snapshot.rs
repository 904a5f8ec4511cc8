use std::collections::VecDeque;

/// Snapshot sliding window.
///
/// Keeps a ring of timestamped snapshots for at most `stale_ttl_ms`, and
/// answers "give me the most recent snapshot old enough to be unfresh" —
/// used to diff a current histogram against one taken at least
/// `fresh_ttl_ms` ago.
#[derive(Debug, Clone)]
pub struct SnapshotWindow<S> {
    fresh_ttl_ms: i64,
    stale_ttl_ms: i64,
    entries: VecDeque<(i64, S)>,
}

impl<S> SnapshotWindow<S> {
    /// `fresh_ttl_ms` must be less than `stale_ttl_ms`.
    pub fn new(fresh_ttl_ms: i64, stale_ttl_ms: i64) -> Self {
        Self {
            fresh_ttl_ms,
            stale_ttl_ms,
            entries: VecDeque::new(),
        }
    }

    pub fn append(&mut self, now: i64, snapshot: S) {
        while let Some(&(ts, _)) = self.entries.front() {
            if ts + self.stale_ttl_ms <= now {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        self.entries.push_back((now, snapshot));
    }

    /// Most recent snapshot whose age is in `[fresh_ttl_ms, stale_ttl_ms]`.
    pub fn get_last_unfresh_snapshot(&self, now: i64) -> Option<&S> {
        let fresh_cutoff = now - self.fresh_ttl_ms;
        let stale_cutoff = now - self.stale_ttl_ms;
        self.entries
            .iter()
            .rev()
            .find(|&&(ts, _)| ts <= fresh_cutoff && ts > stale_cutoff)
            .map(|(_, s)| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_most_recent_unfresh_snapshot() {
        let mut w = SnapshotWindow::new(100, 1000);
        w.append(0, "a");
        w.append(50, "b");
        w.append(200, "c");
        // at now=250: cutoff=150, entries with ts<=150 are "a"(0) and "b"(50); most recent is "b"
        assert_eq!(w.get_last_unfresh_snapshot(250), Some(&"b"));
    }

    #[test]
    fn nothing_unfresh_returns_none() {
        let mut w = SnapshotWindow::new(100, 1000);
        w.append(0, "a");
        assert_eq!(w.get_last_unfresh_snapshot(50), None);
    }

    #[test]
    fn entries_older_than_stale_ttl_are_dropped() {
        let mut w = SnapshotWindow::new(100, 1000);
        w.append(0, "a");
        w.append(2000, "b");
        // "a" should have been pruned on the second append
        assert_eq!(w.get_last_unfresh_snapshot(2000), None);
    }

    #[test]
    fn stale_entry_still_in_the_ring_is_not_returned_as_unfresh() {
        // no append occurs between ts=10 and the read at now=5000, so
        // nothing prunes the ring; the read itself must bound by stale_ttl.
        let mut w = SnapshotWindow::new(100, 1000);
        w.append(0, "a");
        w.append(10, "b");
        assert_eq!(w.get_last_unfresh_snapshot(5000), None);
    }
}
