use serde::{Deserialize, Serialize};

/// One instrument registered for analysis. `name` is the unique key.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct TrackedInstrument {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TrackedInstrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
        }
    }

    pub fn inactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Names of the active instruments, in supplied order, first occurrence wins.
pub fn active_names(instruments: &[TrackedInstrument]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(instruments.len());
    for inst in instruments.iter().filter(|i| i.active) {
        if !names.iter().any(|n| n == &inst.name) {
            names.push(inst.name.clone());
        }
    }
    names
}

impl std::fmt::Display for TrackedInstrument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.active {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} (inactive)", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_names_keep_order_and_drop_duplicates() {
        let list = vec![
            TrackedInstrument::new("EUR/USD OTC"),
            TrackedInstrument::inactive("GBP/JPY OTC"),
            TrackedInstrument::new("AUD/CAD OTC"),
            TrackedInstrument::new("EUR/USD OTC"),
        ];
        assert_eq!(active_names(&list), vec!["EUR/USD OTC", "AUD/CAD OTC"]);
    }

    #[test]
    fn missing_active_flag_defaults_to_true() {
        let inst: TrackedInstrument = serde_json::from_str(r#"{"name":"USD/JPY OTC"}"#).unwrap();
        assert!(inst.active);
    }
}
