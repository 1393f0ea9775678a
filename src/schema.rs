/// Column-name and marker-value constants for the recipient data.
/// Single source of truth for both the pipeline and the charts.

// ── Recipient record columns ────────────────────────────────────────────────
pub mod cols {
    pub const PERIOD: &str = "period";
    pub const SCHEME_DESCRIPTION: &str = "scheme_description";
    pub const NATIONALITY: &str = "nationality";
    pub const RECIPIENTS: &str = "recipients";
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    /// Per-(period, scheme) denominator joined from the total-marker rows.
    pub const RECIPIENTS_TOTAL: &str = "recipients_total";
    pub const PERCENTAGE: &str = "percentage";
}

// ── Reserved nationality values ─────────────────────────────────────────────
pub mod nationality {
    /// Total marker: the row whose count is the sum across all nationalities
    /// for its (period, scheme). Trusted, never verified.
    pub const ALL: &str = "All";
    /// Excluded from the charts; the reference line stands in for the
    /// non-Irish population share instead.
    pub const IRISH: &str = "Irish nationals";
}

// ── Default file names ──────────────────────────────────────────────────────
pub mod files {
    pub const RECIPIENTS_CSV: &str = "nationality.csv";
    pub const SHARES_CSV: &str = "sorted_nationality_percentage_by_scheme_and_quarter.csv";
    pub const CHART_DIR: &str = "charts";
}
