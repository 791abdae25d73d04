//! Proptest generators for CLI inputs.

use proptest::prelude::*;

/// Loop delays the CLI accepts, in milliseconds.
pub fn valid_delay_strategy() -> impl Strategy<Value = u64> {
    1u64..=1000u64
}

/// Loop delay arguments the CLI must reject.
///
/// Covers zero, values above the limit, negatives and non-numeric text.
pub fn invalid_delay_arg_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0".to_string()),
        (1001u64..10_000_000u64).prop_map(|d| d.to_string()),
        (1i64..10_000i64).prop_map(|d| format!("-{d}")),
        "[a-z]{1,8}",
        (1u32..1000u32).prop_map(|d| format!("{d}.5")),
    ]
}

/// Profile names as configured on the broker.
pub fn profile_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Default".to_string()),
        "[A-Z][a-zA-Z0-9_]{0,15}",
    ]
}

/// Data accepted by the `hash` subcommand.
///
/// Leading dashes are excluded so clap does not read the value as a flag.
pub fn hash_data_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.:/]{1,64}"
}

/// Non-empty certificate subjects.
pub fn subject_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{3,12}", "[A-Z]{2}").prop_map(|(cn, c)| format!("CN={cn}.example.com,C={c}"))
}
