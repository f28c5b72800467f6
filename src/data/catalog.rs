use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::config::{CATALOG, FALLBACK_PAIRS};
use crate::domain::TrackedInstrument;

/// One tradable instrument as listed by a catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Payout percentage, when the catalog reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
}

fn default_active() -> bool {
    true
}

impl CatalogEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            kind: Some("otc".to_string()),
            active: true,
            category: Some("forex".to_string()),
            payout: None,
        }
    }

    /// "EURUSD_otc" -> "EURUSD OTC", "EUR_USD_otc" -> "EUR/USD OTC"
    pub fn display_name_for(symbol: &str) -> String {
        format!("{} OTC", symbol.replace("_otc", "").replace('_', "/"))
    }

    pub fn to_tracked(&self) -> TrackedInstrument {
        TrackedInstrument {
            name: self.name.clone(),
            active: self.active,
        }
    }
}

#[async_trait]
pub trait InstrumentCatalog: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>>;

    /// Identifies the provider that ended up supplying the list.
    fn signature(&self) -> &'static str;
}

/// Tries each provider in turn; the built-in list is the last resort.
pub async fn load_catalog(
    providers: &[Box<dyn InstrumentCatalog>],
) -> (Vec<CatalogEntry>, &'static str) {
    for provider in providers {
        match provider.fetch().await {
            Ok(entries) if !entries.is_empty() => {
                #[cfg(debug_assertions)]
                if DEBUG_FLAGS.print_catalog {
                    log::info!(
                        "📋 Catalog '{}' supplied {} instruments",
                        provider.signature(),
                        entries.len()
                    );
                }
                return (entries, provider.signature());
            }
            Ok(_) => {
                log::warn!("Catalog '{}' returned no instruments", provider.signature());
            }
            Err(e) => {
                log::warn!("Catalog '{}' unavailable: {:#}", provider.signature(), e);
            }
        }
    }

    let fallback = StaticCatalog;
    log::warn!(
        "⚠️  Falling back to the built-in list of {} instruments",
        FALLBACK_PAIRS.len()
    );
    (fallback.entries(), fallback.signature())
}

/// Active entries only, first `max` of them, as tracked instruments.
pub fn select_tracked(entries: &[CatalogEntry], max: usize) -> Vec<TrackedInstrument> {
    entries
        .iter()
        .filter(|e| e.active)
        .take(max)
        .map(CatalogEntry::to_tracked)
        .collect()
}

/// The instrument selection last handed to the scheduler.
///
/// Rescans go through [`update`](Self::update), which only yields a new set when
/// the selection actually differs, so an unchanged catalog never resets the ledger.
#[derive(Debug, Clone, Default)]
pub struct CatalogSelection {
    current: Vec<TrackedInstrument>,
}

impl CatalogSelection {
    pub fn new(current: Vec<TrackedInstrument>) -> Self {
        Self { current }
    }

    pub fn current(&self) -> &[TrackedInstrument] {
        &self.current
    }

    /// `Some(set)` when `selected` differs from the current selection (order included).
    pub fn update(&mut self, selected: Vec<TrackedInstrument>) -> Option<Vec<TrackedInstrument>> {
        if selected == self.current {
            return None;
        }
        log::info!(
            "📋 Catalog selection changed: {} -> {} instruments",
            self.current.len(),
            selected.len()
        );
        self.current = selected.clone();
        Some(selected)
    }
}

/// Keep entries paying at least `min_payout`. If none qualify, the list is returned as is.
pub fn filter_by_payout(entries: Vec<CatalogEntry>, min_payout: f64) -> Vec<CatalogEntry> {
    let qualifying: Vec<CatalogEntry> = entries
        .iter()
        .filter(|e| e.payout.unwrap_or(0.0) >= min_payout)
        .cloned()
        .collect();

    if qualifying.is_empty() {
        log::info!(
            "No instrument pays ≥ {}%, keeping all {}",
            min_payout,
            entries.len()
        );
        entries
    } else {
        log::info!(
            "✅ {} instruments with payout ≥ {}%",
            qualifying.len(),
            min_payout
        );
        qualifying
    }
}

/// The local catalog service over HTTP.
pub struct RemoteCatalog {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(CATALOG.client.request_timeout_ms))
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_health(&self) -> Result<()> {
        let url = self.url(CATALOG.endpoints.health_path);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_millis(CATALOG.client.health_timeout_ms))
            .send()
            .await
            .with_context(|| format!("Catalog health check failed: {}", url))?;
        if !response.status().is_success() {
            bail!("Catalog health check returned {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl InstrumentCatalog for RemoteCatalog {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
        self.check_health().await?;

        let url = self.url(CATALOG.endpoints.instruments_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;
        if !response.status().is_success() {
            return Err(anyhow!("Catalog API error: {}", response.status()));
        }
        let mut entries: Vec<CatalogEntry> = response
            .json()
            .await
            .context("Failed to decode catalog response")?;
        for entry in entries.iter_mut().filter(|e| e.name.is_empty()) {
            entry.name = CatalogEntry::display_name_for(&entry.symbol);
        }

        Ok(filter_by_payout(entries, CATALOG.min_payout_pct))
    }

    fn signature(&self) -> &'static str {
        "Remote Catalog"
    }
}

/// The built-in forex OTC list.
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn entries(&self) -> Vec<CatalogEntry> {
        FALLBACK_PAIRS
            .iter()
            .map(|(symbol, name)| CatalogEntry::new(*symbol, *name))
            .collect()
    }
}

#[async_trait]
impl InstrumentCatalog for StaticCatalog {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries())
    }

    fn signature(&self) -> &'static str {
        "Built-in List"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCatalog;

    #[async_trait]
    impl InstrumentCatalog for FailingCatalog {
        async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
            Err(anyhow!("connection refused"))
        }

        fn signature(&self) -> &'static str {
            "Failing"
        }
    }

    struct FixedCatalog(Vec<CatalogEntry>);

    #[async_trait]
    impl InstrumentCatalog for FixedCatalog {
        async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
            Ok(self.0.clone())
        }

        fn signature(&self) -> &'static str {
            "Fixed"
        }
    }

    fn entry(name: &str, payout: Option<f64>, active: bool) -> CatalogEntry {
        CatalogEntry {
            payout,
            active,
            ..CatalogEntry::new(name.replace('/', ""), name)
        }
    }

    #[tokio::test]
    async fn falls_back_to_built_in_list() {
        let providers: Vec<Box<dyn InstrumentCatalog>> = vec![Box::new(FailingCatalog)];
        let (entries, source) = load_catalog(&providers).await;
        assert_eq!(source, "Built-in List");
        assert_eq!(entries.len(), 28);
        assert_eq!(entries[0].name, "AUD/CAD OTC");
        assert_eq!(entries[27].name, "USD/JPY OTC");
    }

    #[tokio::test]
    async fn first_working_provider_wins() {
        let providers: Vec<Box<dyn InstrumentCatalog>> = vec![
            Box::new(FailingCatalog),
            Box::new(FixedCatalog(Vec::new())),
            Box::new(FixedCatalog(vec![entry("X/Y OTC", Some(90.0), true)])),
        ];
        let (entries, source) = load_catalog(&providers).await;
        assert_eq!(source, "Fixed");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn payout_filter_keeps_everything_when_nothing_qualifies() {
        let all = vec![entry("A", Some(80.0), true), entry("B", None, true)];
        assert_eq!(filter_by_payout(all.clone(), 85.0), all);

        let mixed = vec![entry("A", Some(80.0), true), entry("B", Some(85.0), true)];
        let kept = filter_by_payout(mixed, 85.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "B");
    }

    #[test]
    fn only_active_entries_are_tracked() {
        let entries = vec![
            entry("A", None, true),
            entry("B", None, false),
            entry("C", None, true),
            entry("D", None, true),
        ];
        let tracked = select_tracked(&entries, 2);
        let names: Vec<&str> = tracked.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn unchanged_selection_is_not_resent() {
        let entries = vec![entry("A", None, true), entry("B", None, true)];
        let mut selection = CatalogSelection::new(select_tracked(&entries, 5));

        assert_eq!(selection.update(select_tracked(&entries, 5)), None);

        // Inactive extras do not change the tracked set either
        let mut rescanned = entries.clone();
        rescanned.push(entry("C", None, false));
        assert_eq!(selection.update(select_tracked(&rescanned, 5)), None);
    }

    #[test]
    fn changed_selection_is_resent_once() {
        let mut selection = CatalogSelection::new(select_tracked(&[entry("A", None, true)], 5));

        let rescanned = vec![entry("A", None, true), entry("B", None, true)];
        let changed = selection.update(select_tracked(&rescanned, 5)).unwrap();
        let names: Vec<&str> = changed.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(selection.current().len(), 2);

        assert_eq!(selection.update(select_tracked(&rescanned, 5)), None);

        // Reordering is a change: rotation follows supplied order
        let reordered = vec![entry("B", None, true), entry("A", None, true)];
        assert!(selection.update(select_tracked(&reordered, 5)).is_some());
    }

    #[test]
    fn decodes_service_payload() {
        let json = r#"[
            {"symbol":"EURUSD_otc","name":"EUR/USD OTC","type":"otc","active":true,"category":"forex","payout":92},
            {"symbol":"GBPJPY_otc","name":"GBP/JPY OTC"}
        ]"#;
        let entries: Vec<CatalogEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].payout, Some(92.0));
        assert_eq!(entries[0].kind.as_deref(), Some("otc"));
        assert!(entries[1].active);
        assert_eq!(entries[1].payout, None);
    }

    #[test]
    fn display_name_from_symbol() {
        assert_eq!(CatalogEntry::display_name_for("EUR_USD_otc"), "EUR/USD OTC");
        assert_eq!(CatalogEntry::display_name_for("EURUSD_otc"), "EURUSD OTC");
    }
}
