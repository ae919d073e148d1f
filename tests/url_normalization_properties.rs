//! Property-based checks for the two universal URL invariants spec.md §8
//! phrases as "for all URLs u": normalization idempotence and equivalence
//! under cosmetic variation (default port, trailing slash, percent-case,
//! host case, query order).

use docscrawl::url_info::URLInfo;
use proptest::prelude::*;

fn host_label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}".prop_map(|s| s)
}

fn path_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,8}".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Invariant 1: `normalize(normalize(u)) == normalize(u)`.
    #[test]
    fn normalization_is_idempotent(
        host in host_label(),
        segments in prop::collection::vec(path_segment(), 0..4),
        scheme in prop_oneof![Just("http"), Just("https")],
    ) {
        let path = segments.join("/");
        let raw = format!("{scheme}://{host}.example.com/{path}");
        let once = URLInfo::parse_standalone(&raw);
        prop_assert!(once.is_valid());
        let twice = URLInfo::parse_standalone(once.normalized());
        prop_assert_eq!(once.normalized(), twice.normalized());
    }

    /// Invariant 2: default-port, host-case, and trailing-slash-on-root
    /// variants of the same URL normalize identically.
    #[test]
    fn default_port_and_case_variants_are_equal(
        host in host_label(),
        upper_host in prop::bool::ANY,
        explicit_default_port in prop::bool::ANY,
    ) {
        let host = format!("{host}.example.com");
        let authority_host = if upper_host { host.to_uppercase() } else { host.clone() };
        let port = if explicit_default_port { ":443" } else { "" };
        let raw = format!("https://{authority_host}{port}/docs");
        let baseline = URLInfo::parse_standalone(&format!("https://{host}/docs"));
        let variant = URLInfo::parse_standalone(&raw);
        prop_assert!(baseline.is_valid());
        prop_assert!(variant.is_valid());
        prop_assert_eq!(baseline.normalized(), variant.normalized());
    }

    /// Invariant 2 continued: query parameter order never affects the
    /// comparison key or the normalized string.
    #[test]
    fn query_param_order_is_insensitive(
        host in host_label(),
        a_val in "[a-z0-9]{1,6}",
        b_val in "[a-z0-9]{1,6}",
    ) {
        let host = format!("{host}.example.com");
        let forward = URLInfo::parse_standalone(&format!("https://{host}/s?a={a_val}&b={b_val}"));
        let reversed = URLInfo::parse_standalone(&format!("https://{host}/s?b={b_val}&a={a_val}"));
        prop_assert!(forward.is_valid());
        prop_assert!(reversed.is_valid());
        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(forward.normalized(), reversed.normalized());
    }

    /// Round-trip: normalizing, re-parsing the normalized string, and
    /// normalizing again always yields the same string (un-parse + re-parse
    /// stability, spec.md §8 "round-trips and idempotence").
    #[test]
    fn reparse_roundtrip_is_stable(
        host in host_label(),
        segments in prop::collection::vec(path_segment(), 0..3),
    ) {
        let path = segments.join("/");
        let raw = format!("HTTP://{host}.EXAMPLE.com:80/{path}/");
        let first = URLInfo::parse_standalone(&raw);
        prop_assert!(first.is_valid());
        let reparsed = URLInfo::parse_standalone(first.normalized());
        let reparsed_again = URLInfo::parse_standalone(reparsed.normalized());
        prop_assert_eq!(reparsed.normalized(), reparsed_again.normalized());
        prop_assert_eq!(first.normalized(), reparsed.normalized());
    }
}
