use proptest::prelude::*;

use guru_types::{Amount, HashRate, Timestamp, UserId};

proptest! {
    /// Key bytes preserve id ordering, so LMDB iteration follows user ids.
    #[test]
    fn user_key_ordering(a in any::<u64>(), b in any::<u64>()) {
        let (ka, kb) = (UserId::new(a).to_key(), UserId::new(b).to_key());
        prop_assert_eq!(ka <= kb, a <= b);
        prop_assert_eq!(UserId::from_key(&ka).unwrap(), UserId::new(a));
    }

    /// The exact rendering of an amount parses back to the same raw value.
    #[test]
    fn amount_exact_string_parses_back(raw in any::<u128>()) {
        let amount = Amount::new(raw);
        let parsed: Amount = amount.to_exact_string().parse().unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// Display never shows more than eight fractional digits and never rounds up.
    #[test]
    fn amount_display_truncates(raw in 0u128..10u128.pow(30)) {
        let shown: Amount = Amount::new(raw).to_string().parse().unwrap();
        prop_assert!(shown <= Amount::new(raw));
        prop_assert!(Amount::new(raw).raw() - shown.raw() < 10u128.pow(10));
    }

    /// Any positive micro value is a valid hash rate.
    #[test]
    fn positive_hash_rates_accepted(micros in 1u64..u64::MAX) {
        prop_assert_eq!(HashRate::from_micros(micros).unwrap().micros(), micros);
    }

    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in any::<u64>(), b in any::<u64>()) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(tb.millis_since(ta).is_some(), a <= b);
    }

    /// Records are stored with bincode; amounts must survive it unchanged.
    #[test]
    fn amount_bincode_preserves_raw(raw in any::<u128>()) {
        let encoded = bincode::serialize(&Amount::new(raw)).unwrap();
        let decoded: Amount = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.raw(), raw);
    }
}
