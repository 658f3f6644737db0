//! Preference keys stored in each book's preference file

/// bool, default `true`: transactions must balance
pub const USE_DOUBLE_ENTRY: &str = "use_double_entry";

/// string, ISO 4217 code used for new accounts and transactions
pub const DEFAULT_CURRENCY: &str = "default_currency";

/// bool, default `false`: keep opening-balance transactions when all
/// transactions are deleted
pub const SAVE_OPENING_BALANCES: &str = "save_opening_balances";

/// i64, unix seconds of the last successful export
pub const LAST_EXPORT_TIME: &str = "last_export_time";

/// Every key the settings screens know about
pub const ALL: &[&str] = &[
    USE_DOUBLE_ENTRY,
    DEFAULT_CURRENCY,
    SAVE_OPENING_BALANCES,
    LAST_EXPORT_TIME,
];
