//! Algebraic laws of `Expected`, checked with proptest

use emb_error::Expected;
use proptest::prelude::*;

fn expected_strategy() -> impl Strategy<Value = Expected<i32, u8>> {
    prop_oneof![
        any::<i32>().prop_map(Expected::Value),
        any::<u8>().prop_map(Expected::unexpected),
    ]
}

fn f(v: i32) -> Expected<i64, u8> {
    if v % 3 == 0 { Expected::unexpected(3) } else { Expected::Value(i64::from(v) * 2) }
}

fn g(v: i64) -> Expected<String, u8> {
    if v < 0 { Expected::unexpected(7) } else { Expected::Value(v.to_string()) }
}

proptest! {
    #[test]
    fn exactly_one_side(x in expected_strategy()) {
        prop_assert!(x.has_value() != x.has_error());
    }

    #[test]
    fn map_identity(x in expected_strategy()) {
        prop_assert_eq!(x.map(|v| v), x);
    }

    #[test]
    fn bind_is_associative(x in expected_strategy()) {
        let left = x.and_then(f).and_then(g);
        let right = x.and_then(|v| f(v).and_then(g));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn value_or_totality(v in any::<i32>(), e in any::<u8>(), d in any::<i32>()) {
        prop_assert_eq!(Expected::<i32, u8>::Value(v).value_or(d), v);
        prop_assert_eq!(Expected::<i32, u8>::unexpected(e).value_or(d), d);
    }

    #[test]
    fn map_and_map_err_touch_one_side(x in expected_strategy()) {
        let mut map_calls = 0;
        let mut err_calls = 0;
        let _ = x.map(|v| { map_calls += 1; v });
        let _ = x.map_err(|e| { err_calls += 1; e });
        prop_assert_eq!(map_calls, usize::from(x.has_value()));
        prop_assert_eq!(err_calls, usize::from(x.has_error()));
    }

    #[test]
    fn swap_twice_is_identity(a in expected_strategy(), b in expected_strategy()) {
        let (mut x, mut y) = (a, b);
        x.swap(&mut y);
        prop_assert_eq!((x, y), (b, a));
        x.swap(&mut y);
        prop_assert_eq!((x, y), (a, b));
    }
}
