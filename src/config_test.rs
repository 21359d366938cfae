use super::*;

#[test]
fn defaults_match_the_documented_policy() {
    let cfg = GuardConfig::default();
    assert_eq!(cfg.window_ms, 10_000);
    assert_eq!(cfg.max_redirects_per_window, 2);
    assert_eq!(cfg.settle_ms, 500);
    assert_eq!(cfg.nav_delay_ms, 200);
    assert_eq!(cfg.redirect_cooldown_ms, 5_000);
    assert_eq!(cfg.auth_redirect_window_ms, 10_000);
    assert_eq!(cfg.max_settled_transitions, 5);
    assert!(cfg.allow_unverified_emails.is_empty());
    assert!(!cfg.allow_unverified_local);
}

#[test]
fn parse_email_list_trims_lowercases_and_drops_empties() {
    let list = parse_email_list(" Admin@Example.com , ,tester@example.com,");
    assert_eq!(list, vec!["admin@example.com", "tester@example.com"]);
    assert!(parse_email_list("").is_empty());
}

#[test]
fn allow_list_lookup_is_case_insensitive() {
    let cfg = GuardConfig {
        allow_unverified_emails: parse_email_list("admin@example.com"),
        ..GuardConfig::default()
    };
    assert!(cfg.email_allow_listed("admin@example.com"));
    assert!(cfg.email_allow_listed("  ADMIN@example.COM "));
    assert!(!cfg.email_allow_listed("other@example.com"));
}
