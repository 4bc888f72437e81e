//! Property tests for the composite key orderings
//!
//! - Antisymmetry and identity of the full order
//! - Raw path and object path never disagree
//! - Equal grouping keys always share a partition
//! - Codec round trip and partition range

use proptest::prelude::*;

use secondary_sort::{
    CompositeKey, full_compare, full_compare_raw, group_compare, group_compare_raw, partition,
    partition_raw,
};

// Small alphabet so generated pairs often share a first field.
fn field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ab]{0,3}",
        "[a-z]{0,12}",
        any::<String>(),
    ]
}

fn composite_key() -> impl Strategy<Value = CompositeKey> {
    (field(), field()).prop_map(|(first, second)| CompositeKey::new(first, second))
}

fn raw_full(a: &CompositeKey, b: &CompositeKey, ascending: bool) -> i32 {
    let (ea, eb) = (a.encode(), b.encode());
    full_compare_raw(&ea, 0, ea.len(), &eb, 0, eb.len(), ascending).unwrap()
}

fn raw_group(a: &CompositeKey, b: &CompositeKey, ascending: bool) -> i32 {
    let (ea, eb) = (a.encode(), b.encode());
    group_compare_raw(&ea, 0, ea.len(), &eb, 0, eb.len(), ascending).unwrap()
}

proptest! {
    #[test]
    fn full_order_antisymmetric(a in composite_key(), b in composite_key()) {
        prop_assert_eq!(full_compare(&a, &b, true), -full_compare(&b, &a, true));
    }

    #[test]
    fn full_order_zero_iff_equal(a in composite_key(), b in composite_key()) {
        let zero = full_compare(&a, &b, true) == 0;
        prop_assert_eq!(zero, a.first() == b.first() && a.second() == b.second());
        prop_assert_eq!(full_compare(&a, &a.clone(), true), 0);
    }

    #[test]
    fn full_raw_matches_object(a in composite_key(), b in composite_key(), ascending in any::<bool>()) {
        prop_assert_eq!(full_compare(&a, &b, ascending), raw_full(&a, &b, ascending));
    }

    #[test]
    fn group_raw_matches_object(a in composite_key(), b in composite_key(), ascending in any::<bool>()) {
        prop_assert_eq!(group_compare(&a, &b, ascending), raw_group(&a, &b, ascending));
    }

    #[test]
    fn descending_is_reverse(a in composite_key(), b in composite_key()) {
        prop_assert_eq!(full_compare(&a, &b, false), -full_compare(&a, &b, true));
        prop_assert_eq!(group_compare(&a, &b, false), -group_compare(&a, &b, true));
    }

    #[test]
    fn grouping_implies_same_partition(
        a in composite_key(),
        second in field(),
        n in 1usize..64,
    ) {
        let b = CompositeKey::new(a.first(), second);
        prop_assert_eq!(group_compare(&a, &b, true), 0);
        prop_assert_eq!(partition(&a, n), partition(&b, n));
    }

    #[test]
    fn equal_groups_share_partition(a in composite_key(), b in composite_key(), n in 1usize..64) {
        if group_compare(&a, &b, true) == 0 {
            prop_assert_eq!(partition(&a, n), partition(&b, n));
        }
    }

    #[test]
    fn roundtrip(k in composite_key()) {
        let encoded = k.encode();
        prop_assert_eq!(encoded.len(), k.encoded_len());
        prop_assert_eq!(CompositeKey::decode(&encoded).unwrap(), k);
    }

    #[test]
    fn partition_in_range(k in composite_key(), n in 1usize..1024) {
        let p = partition(&k, n);
        prop_assert!(p < n);
        let encoded = k.encode();
        prop_assert_eq!(partition_raw(&encoded, 0, encoded.len(), n).unwrap(), p);
    }

    #[test]
    fn truncated_never_decodes(k in composite_key(), cut in any::<prop::sample::Index>()) {
        let encoded = k.encode();
        let cut = cut.index(encoded.len());
        prop_assert!(CompositeKey::decode(&encoded[..cut]).is_err());
    }

    #[test]
    fn garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = CompositeKey::decode(&data);
        let other = CompositeKey::new("x", "y").encode();
        let _ = full_compare_raw(&data, 0, data.len(), &other, 0, other.len(), true);
        let _ = group_compare_raw(&data, 0, data.len(), &other, 0, other.len(), true);
    }
}
