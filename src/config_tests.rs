#![allow(clippy::unwrap_used)]

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn parse(content: &str, overrides: Overrides) -> Result<Config> {
    Config::parse(content, PathBuf::from("/data"), Some("env-user".into()), overrides)
}

// ── Config::parse ─────────────────────────────────────────────

#[test]
fn test_empty_file_uses_defaults() {
    let config = parse("", Overrides::default()).unwrap();
    assert_eq!(config.user, "env-user");
    assert_eq!(config.database, PathBuf::from("/data/cashcraft.db"));
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.recent_expenses, 5);
    assert_eq!(config.dashboard_goals, 3);
    assert_eq!(config.log_file(), PathBuf::from("/data/cashcraft.log"));
}

#[test]
fn test_file_values_are_used() {
    let content = r#"
        user = "alice"
        database = "/tmp/ledger.db"
        log_level = "cashcraft=debug"
        recent_expenses = 10
        dashboard_goals = 1
    "#;
    let config = parse(content, Overrides::default()).unwrap();
    assert_eq!(config.user, "alice");
    assert_eq!(config.database, PathBuf::from("/tmp/ledger.db"));
    assert_eq!(config.log_level, "cashcraft=debug");
    assert_eq!(config.recent_expenses, 10);
    assert_eq!(config.dashboard_goals, 1);
}

#[test]
fn test_overrides_beat_file() {
    let overrides = Overrides {
        user: Some("bob".into()),
        database: Some(PathBuf::from("/elsewhere.db")),
    };
    let config = parse("user = \"alice\"\ndatabase = \"/tmp/a.db\"", overrides).unwrap();
    assert_eq!(config.user, "bob");
    assert_eq!(config.database, PathBuf::from("/elsewhere.db"));
}

#[test]
fn test_blank_user_falls_back() {
    let config = Config::parse("user = \"  \"", PathBuf::from("/d"), None, Overrides::default())
        .unwrap();
    assert_eq!(config.user, "default");
}

#[test]
fn test_unknown_key_rejected() {
    assert!(parse("colour = \"blue\"", Overrides::default()).is_err());
}

#[test]
fn test_malformed_file_rejected() {
    assert!(parse("user = ", Overrides::default()).is_err());
    assert!(parse("recent_expenses = \"many\"", Overrides::default()).is_err());
}

// ── Global flags ──────────────────────────────────────────────

#[test]
fn test_split_flags_anywhere() {
    let (overrides, rest) =
        split_global_flags(&args(&["--user", "alice", "budget", "show", "--db", "x.db"]))
            .unwrap();
    assert_eq!(overrides.user.as_deref(), Some("alice"));
    assert_eq!(overrides.database, Some(PathBuf::from("x.db")));
    assert_eq!(rest, args(&["budget", "show"]));
}

#[test]
fn test_split_flags_none() {
    let (overrides, rest) = split_global_flags(&args(&["summary"])).unwrap();
    assert_eq!(overrides, Overrides::default());
    assert_eq!(rest, args(&["summary"]));
}

#[test]
fn test_split_flags_missing_value() {
    assert!(split_global_flags(&args(&["--user"])).is_err());
    assert!(split_global_flags(&args(&["list", "--db"])).is_err());
}

#[test]
fn test_expand_home_only_touches_tilde() {
    assert_eq!(expand_home(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
    assert_eq!(expand_home(Path::new("rel/x.db")), PathBuf::from("rel/x.db"));
}
