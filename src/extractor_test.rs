use super::*;

#[test]
fn test_parse_count_suffixes() {
    assert_eq!(parse_count("1K"), 1000);
    assert_eq!(parse_count("2.3K"), 2300);
    assert_eq!(parse_count("1.5m"), 1_500_000);
    assert_eq!(parse_count("4k reactions"), 4000);
}

#[test]
fn test_parse_count_plain_numbers() {
    assert_eq!(parse_count("15"), 15);
    assert_eq!(parse_count("Liked by 42 people"), 42);
    assert_eq!(parse_count("7.9"), 7);
}

#[test]
fn test_parse_count_comma_is_a_decimal_mark() {
    assert_eq!(parse_count("2,3K"), 2300);
    assert_eq!(parse_count("1,204"), 1);
}

#[test]
fn test_parse_count_failures_are_zero() {
    assert_eq!(parse_count(""), 0);
    assert_eq!(parse_count("abc"), 0);
    assert_eq!(parse_count("99999999999999999999"), 0);
    assert_eq!(parse_count("99999999999999999M"), 0);
}

#[test]
fn test_parse_count_long_fraction_is_truncated() {
    assert_eq!(parse_count("1.23456789M"), 1_234_567);
}

#[test]
fn test_boilerplate_detection() {
    assert!(is_boilerplate("Translate post"));
    assert!(is_boilerplate("and then...more"));
    assert!(is_boilerplate("and then…more"));
    assert!(!is_boilerplate("A real paragraph about Translate"));
}
