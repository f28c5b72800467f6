/// Round-robin "attention slot" over the tracked instruments.
///
/// Rotation follows the order the instruments were supplied in. It runs on its
/// own cadence and knows nothing about windows.
#[derive(Debug, Default, Clone)]
pub struct AttentionRotator {
    instruments: Vec<String>,
    index: usize,
    live: Option<String>,
    // Live instrument vanished in a reconfiguration; next rotation restarts at index 0
    fallback_pending: bool,
    rotations: u64,
}

impl AttentionRotator {
    /// The first instrument is live immediately.
    pub fn new(instruments: Vec<String>) -> Self {
        let mut rotator = Self::default();
        rotator.set_instruments(instruments);
        rotator
    }

    /// Swap the tracked set between ticks.
    ///
    /// - live instrument still present: it stays live, rotation continues after it
    /// - live instrument removed: nothing is live until the next rotation, which restarts at index 0
    /// - nothing live yet: the first instrument becomes live
    pub fn set_instruments(&mut self, instruments: Vec<String>) {
        self.instruments = instruments;

        if self.instruments.is_empty() {
            self.live = None;
            self.index = 0;
            self.fallback_pending = false;
            return;
        }

        match self.live.take() {
            Some(live) => match self.position_of(&live) {
                Some(pos) => {
                    self.index = pos;
                    self.live = Some(live);
                }
                None => {
                    self.index = 0;
                    self.fallback_pending = true;
                }
            },
            None if self.fallback_pending => {}
            None => {
                self.index = 0;
                self.live = Some(self.instruments[0].clone());
            }
        }
    }

    /// Advance the attention slot by one. A no-op on an empty set.
    pub fn rotate(&mut self) -> Option<&str> {
        if self.instruments.is_empty() {
            return None;
        }

        let next = match (&self.live, self.fallback_pending) {
            (Some(live), false) => match self.position_of(live) {
                Some(pos) => (pos + 1) % self.instruments.len(),
                None => 0,
            },
            _ => 0,
        };

        self.index = next;
        self.fallback_pending = false;
        self.live = Some(self.instruments[next].clone());
        self.rotations += 1;
        self.live.as_deref()
    }

    pub fn live(&self) -> Option<&str> {
        self.live.as_deref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.instruments.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rotation_follows_supplied_order() {
        let mut rotator = AttentionRotator::new(names(&["A", "B", "C"]));
        assert_eq!(rotator.live(), Some("A"));

        let seen: Vec<String> = (0..4)
            .map(|_| rotator.rotate().unwrap().to_string())
            .collect();
        assert_eq!(seen, names(&["B", "C", "A", "B"]));
    }

    #[test]
    fn order_is_not_alphabetical() {
        let mut rotator = AttentionRotator::new(names(&["USD/JPY", "AUD/CAD", "EUR/USD"]));
        assert_eq!(rotator.rotate(), Some("AUD/CAD"));
        assert_eq!(rotator.rotate(), Some("EUR/USD"));
    }

    #[test]
    fn every_instrument_gets_its_share() {
        let list = names(&["A", "B", "C"]);
        let mut rotator = AttentionRotator::new(list.clone());
        let m = 10;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..m {
            let live = rotator.rotate().unwrap().to_string();
            *counts.entry(live).or_default() += 1;
        }
        for name in &list {
            assert!(counts.get(name).copied().unwrap_or(0) >= m / list.len(), "{name}");
        }
        assert_eq!(rotator.rotations(), m as u64);
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let mut rotator = AttentionRotator::new(Vec::new());
        assert_eq!(rotator.live(), None);
        assert_eq!(rotator.rotate(), None);
        assert_eq!(rotator.rotations(), 0);
    }

    #[test]
    fn removed_live_instrument_falls_back_to_first_on_next_tick() {
        let mut rotator = AttentionRotator::new(names(&["A", "B", "C"]));
        rotator.rotate(); // B live

        rotator.set_instruments(names(&["C", "D"]));
        assert_eq!(rotator.live(), None);

        assert_eq!(rotator.rotate(), Some("C"));
        assert_eq!(rotator.rotate(), Some("D"));
    }

    #[test]
    fn surviving_live_instrument_keeps_its_place() {
        let mut rotator = AttentionRotator::new(names(&["A", "B", "C"]));
        rotator.rotate(); // B live

        rotator.set_instruments(names(&["X", "B", "Y"]));
        assert_eq!(rotator.live(), Some("B"));
        assert_eq!(rotator.index(), 1);
        assert_eq!(rotator.rotate(), Some("Y"));
    }

    #[test]
    fn first_registration_after_empty_goes_live_immediately() {
        let mut rotator = AttentionRotator::new(Vec::new());
        rotator.set_instruments(names(&["A", "B"]));
        assert_eq!(rotator.live(), Some("A"));
    }
}
