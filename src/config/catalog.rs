//! Instrument-catalog configuration constants.

/// HTTP client defaults for the catalog service
pub struct ClientDefaults {
    pub health_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

/// Endpoints exposed by the local catalog service
pub struct CatalogEndpoints {
    pub base_url: &'static str,
    pub instruments_path: &'static str,
    pub health_path: &'static str,
}

/// The Master Catalog Configuration
pub struct CatalogConfig {
    pub endpoints: CatalogEndpoints,
    pub client: ClientDefaults,
    /// Entries paying out below this percentage are skipped (unless none qualify)
    pub min_payout_pct: f64,
    /// Upper bound on instruments taken from the catalog when none are selected
    pub max_pairs: usize,
    /// How often the catalog is looked up again while running
    pub rescan_secs: u64,
}

pub const CATALOG: CatalogConfig = CatalogConfig {
    endpoints: CatalogEndpoints {
        base_url: "http://localhost:8000",
        instruments_path: "/otc",
        health_path: "/health",
    },
    client: ClientDefaults {
        health_timeout_ms: 3000,
        request_timeout_ms: 10_000,
    },
    min_payout_pct: 85.0,
    max_pairs: 5,
    rescan_secs: 30,
};

/// Built-in fallback list, used whenever the remote lookup is absent or fails.
/// `(symbol, display name)`
pub const FALLBACK_PAIRS: &[(&str, &str)] = &[
    ("AUDCAD_otc", "AUD/CAD OTC"),
    ("AUDCHF_otc", "AUD/CHF OTC"),
    ("AUDJPY_otc", "AUD/JPY OTC"),
    ("AUDNZD_otc", "AUD/NZD OTC"),
    ("AUDUSD_otc", "AUD/USD OTC"),
    ("CADCHF_otc", "CAD/CHF OTC"),
    ("CADJPY_otc", "CAD/JPY OTC"),
    ("CHFJPY_otc", "CHF/JPY OTC"),
    ("EURAUD_otc", "EUR/AUD OTC"),
    ("EURCAD_otc", "EUR/CAD OTC"),
    ("EURCHF_otc", "EUR/CHF OTC"),
    ("EURGBP_otc", "EUR/GBP OTC"),
    ("EURJPY_otc", "EUR/JPY OTC"),
    ("EURNZD_otc", "EUR/NZD OTC"),
    ("EURUSD_otc", "EUR/USD OTC"),
    ("GBPAUD_otc", "GBP/AUD OTC"),
    ("GBPCAD_otc", "GBP/CAD OTC"),
    ("GBPCHF_otc", "GBP/CHF OTC"),
    ("GBPJPY_otc", "GBP/JPY OTC"),
    ("GBPNZD_otc", "GBP/NZD OTC"),
    ("GBPUSD_otc", "GBP/USD OTC"),
    ("NZDCAD_otc", "NZD/CAD OTC"),
    ("NZDCHF_otc", "NZD/CHF OTC"),
    ("NZDJPY_otc", "NZD/JPY OTC"),
    ("NZDUSD_otc", "NZD/USD OTC"),
    ("USDCAD_otc", "USD/CAD OTC"),
    ("USDCHF_otc", "USD/CHF OTC"),
    ("USDJPY_otc", "USD/JPY OTC"),
];
