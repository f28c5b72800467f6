//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep the chatty ones `false` by default so
//! debug builds stay readable. All of them are further gated by
//! `cfg(debug_assertions)` at the call site.

pub struct DebugFlags {
    /// Emit one line per clock tick (window id, countdown, closed flag).
    pub print_window_ticks: bool,
    /// Emit attention-slot changes.
    pub print_rotation: bool,
    /// Emit trigger-gate transitions (eligible / fired / skipped).
    pub print_gate_decisions: bool,
    /// Emit catalog lookup details (provider order, filtered counts).
    pub print_catalog: bool,
    /// Emit ledger evictions.
    pub print_ledger_evictions: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_window_ticks: false,
    print_rotation: false,
    print_gate_decisions: true,
    print_catalog: true,
    print_ledger_evictions: false,
};
