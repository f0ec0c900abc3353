use chatkit_types::{EXTERNAL_ID_BITS, ExternalId, RowId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── RowId ─────────────────────────────────────────────────────────

#[test]
fn row_id_roundtrips_raw_value() {
    let id = RowId::new(42);
    assert_eq!(id.get(), 42);
    assert_eq!(RowId::from(42), id);
}

#[test]
fn row_id_display_is_numeric() {
    assert_eq!(RowId::new(7).to_string(), "7");
}

#[test]
fn row_id_orders_numerically() {
    assert!(RowId::new(2) < RowId::new(10));
}

#[test]
fn row_id_serializes_transparently() {
    let json = serde_json::to_string(&RowId::new(5)).unwrap();
    assert_eq!(json, "5");
}

// ── ExternalId ────────────────────────────────────────────────────

#[test]
fn external_id_generate_is_unique() {
    let ids: HashSet<ExternalId> = (0..1000).map(|_| ExternalId::generate()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn external_id_generate_uses_radix32_alphabet() {
    for _ in 0..100 {
        let id = ExternalId::generate();
        assert!(!id.as_str().is_empty());
        assert!(id.as_str().len() <= 26);
        assert!(id.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='v').contains(&c)));
    }
}

#[test]
fn external_id_entropy_zero_renders_single_digit() {
    assert_eq!(ExternalId::from_entropy(0, 0).as_str(), "0");
}

#[test]
fn external_id_entropy_small_values() {
    assert_eq!(ExternalId::from_entropy(0, 31).as_str(), "v");
    assert_eq!(ExternalId::from_entropy(0, 32).as_str(), "10");
    assert_eq!(ExternalId::from_entropy(0, 1024).as_str(), "100");
}

#[test]
fn external_id_entropy_full_width() {
    let id = ExternalId::from_entropy(0b11, u128::MAX);
    assert_eq!(id.as_str(), "v".repeat(26));
    assert_eq!(EXTERNAL_ID_BITS, 26 * 5);
}

#[test]
fn external_id_high_bits_land_in_top_digit() {
    // bit 128 set, everything else clear: 2^128 = 8 * 32^25
    let id = ExternalId::from_entropy(0b01, 0);
    assert_eq!(id.as_str(), format!("8{}", "0".repeat(25)));
}

#[test]
fn external_id_from_str_trims() {
    let id = ExternalId::from_str("  abc123 ").unwrap();
    assert_eq!(id.as_str(), "abc123");
}

#[test]
fn external_id_from_str_rejects_blank() {
    assert!(ExternalId::from_str("").is_err());
    assert!(ExternalId::from_str("   ").is_err());
}

#[test]
fn external_id_conversions() {
    let a = ExternalId::from("abc");
    let b = ExternalId::from(String::from("abc"));
    let c = ExternalId::new("abc");
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(c.to_string(), "abc");
    assert_eq!(c.into_string(), "abc");
}

#[test]
fn external_id_serialization_roundtrip() {
    let id = ExternalId::generate();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: ExternalId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

proptest! {
    #[test]
    fn entropy_rendering_matches_u128_radix32(low in any::<u128>()) {
        let rendered = ExternalId::from_entropy(0, low);
        let parsed = u128::from_str_radix(rendered.as_str(), 32).unwrap();
        prop_assert_eq!(parsed, low);
    }
}
