//! Round-robin front-end host selection.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Rotation {
    hosts: Vec<String>,
    cursor: usize,
}

/// Hands out front-end base URLs in rotation.
///
/// Rotation state is in memory only; a restart starts again at the
/// first host.
///
/// # Example
///
/// ```
/// use regcap_runtime::LoadBalancer;
///
/// let balancer = LoadBalancer::with_hosts(["http://a", "http://b", "http://c"]);
/// let picks: Vec<_> = (0..4).map(|_| balancer.next_host()).collect();
/// assert_eq!(picks, ["http://a", "http://b", "http://c", "http://a"]);
/// ```
#[derive(Debug, Default)]
pub struct LoadBalancer {
    state: Mutex<Rotation>,
}

impl LoadBalancer {
    /// Creates a balancer with no hosts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a balancer over `hosts`.
    pub fn with_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let balancer = Self::new();
        balancer.set_hosts(hosts);
        balancer
    }

    /// Replaces the host list and restarts the rotation at the first host.
    pub fn set_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock();
        state.hosts = hosts.into_iter().map(Into::into).collect();
        state.cursor = 0;
    }

    /// Appends hosts without disturbing the rotation.
    pub fn add_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().hosts.extend(hosts.into_iter().map(Into::into));
    }

    /// Returns the next host, or `""` when no hosts are configured.
    pub fn next_host(&self) -> String {
        let mut state = self.state.lock();
        if state.hosts.is_empty() {
            return String::new();
        }
        if state.cursor >= state.hosts.len() {
            state.cursor = 0;
        }

        let host = state.hosts[state.cursor].clone();
        state.cursor = (state.cursor + 1) % state.hosts.len();
        host
    }

    /// Returns the configured hosts.
    #[must_use]
    pub fn hosts(&self) -> Vec<String> {
        self.state.lock().hosts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rotates_and_wraps() {
        let balancer = LoadBalancer::with_hosts(["A", "B", "C"]);
        let picks: Vec<_> = (0..7).map(|_| balancer.next_host()).collect();
        assert_eq!(picks, ["A", "B", "C", "A", "B", "C", "A"]);
    }

    #[test]
    fn empty_yields_empty_string() {
        let balancer = LoadBalancer::new();
        assert_eq!(balancer.next_host(), "");
        assert_eq!(balancer.next_host(), "");
    }

    #[test]
    fn set_hosts_resets_cursor() {
        let balancer = LoadBalancer::with_hosts(["A", "B"]);
        assert_eq!(balancer.next_host(), "A");

        balancer.set_hosts(["X", "Y"]);
        assert_eq!(balancer.next_host(), "X");
    }

    #[test]
    fn add_hosts_keeps_position() {
        let balancer = LoadBalancer::with_hosts(["A", "B"]);
        assert_eq!(balancer.next_host(), "A");

        balancer.add_hosts(["C"]);
        let picks: Vec<_> = (0..4).map(|_| balancer.next_host()).collect();
        assert_eq!(picks, ["B", "C", "A", "B"]);
        assert_eq!(balancer.hosts(), ["A", "B", "C"]);
    }

    #[test]
    fn shrinking_list_restarts_from_first() {
        let balancer = LoadBalancer::with_hosts(["A", "B", "C"]);
        balancer.next_host();
        balancer.next_host();
        balancer.state.lock().hosts.truncate(1);
        assert_eq!(balancer.next_host(), "A");
    }

    #[test]
    fn concurrent_picks_are_evenly_spread() {
        let balancer = std::sync::Arc::new(LoadBalancer::with_hosts(["A", "B"]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let balancer = balancer.clone();
                std::thread::spawn(move || (0..50).map(|_| balancer.next_host()).collect::<Vec<_>>())
            })
            .collect();

        let picks: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let a = picks.iter().filter(|h| *h == "A").count();
        assert_eq!(a, 100);
        assert_eq!(picks.len() - a, 100);
    }

    proptest! {
        #[test]
        fn pick_i_is_host_i_mod_len(
            hosts in proptest::collection::vec("[a-z]{1,8}", 1..6),
            draws in 1usize..40,
        ) {
            let balancer = LoadBalancer::with_hosts(hosts.clone());
            for i in 0..draws {
                prop_assert_eq!(balancer.next_host(), hosts[i % hosts.len()].clone());
            }
        }
    }
}
