use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bot_cmd(db_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rss-bot").unwrap();
    cmd.env("RSS_BOT_DB_PATH", db_dir.path().join("bot.db"))
        .env_remove("CHAT_BOT_TOKEN")
        .env_remove("RSS_BOT_POLL_INTERVAL_SECS")
        .env_remove("RSS_BOT_FETCH_TIMEOUT_SECS")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("subscribe"))
        .stdout(predicate::str::contains("unsubscribe"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_run_help_shows_flags() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_list_empty() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No subscriptions configured."));
}

#[test]
fn test_subscribe_invalid_url() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["subscribe", "general", "not-a-url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid URL."));

    bot_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No subscriptions configured."));
}

#[test]
fn test_subscribe_then_list() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["subscribe", "general", "https://example.com/index.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully subscribed to RSS feed: https://example.com/index.xml",
        ));

    bot_cmd(&temp_dir)
        .args(["list", "--channel", "general"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/index.xml"))
        .stdout(predicate::str::contains("general"));

    bot_cmd(&temp_dir)
        .args(["list", "--channel", "news"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No subscriptions configured."));
}

#[test]
fn test_subscribe_duplicate() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["subscribe", "general", "https://example.com/index.xml"])
        .assert()
        .success();

    bot_cmd(&temp_dir)
        .args(["subscribe", "general", "https://example.com/index.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already subscribed"));
}

#[test]
fn test_unsubscribe() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["subscribe", "general", "https://example.com/index.xml"])
        .assert()
        .success();

    bot_cmd(&temp_dir)
        .args(["unsubscribe", "1", "--channel", "news"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Subscription not found: id 1 in channel news",
        ))
        .stderr(predicate::str::contains("SubscriptionFilter").not());

    bot_cmd(&temp_dir)
        .args(["unsubscribe", "1", "--channel", "general"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully deleted subscription 1."));
}

#[test]
fn test_unsubscribe_missing() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["unsubscribe", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Subscription not found"));
}

#[test]
fn test_check_invalid_url() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["check", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid URL."));
}

#[test]
fn test_check_unreachable_feed() {
    let temp_dir = TempDir::new().unwrap();

    bot_cmd(&temp_dir)
        .args(["check", "http://127.0.0.1:9/feed.xml"])
        .env("RSS_BOT_FETCH_TIMEOUT_SECS", "2")
        .assert()
        .success()
        .stdout(predicate::str::contains("No new entries."));
}

mod run_once {
    use super::*;

    #[test]
    fn test_dry_run_no_subscriptions() {
        let temp_dir = TempDir::new().unwrap();

        bot_cmd(&temp_dir)
            .args(["run", "--once", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Checked 0 subscriptions, found 0 new entries.",
            ));
    }

    #[test]
    fn test_run_requires_bot_token() {
        let temp_dir = TempDir::new().unwrap();

        bot_cmd(&temp_dir)
            .args(["run", "--once"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("CHAT_BOT_TOKEN"));
    }

    #[test]
    fn test_invalid_poll_interval() {
        let temp_dir = TempDir::new().unwrap();

        bot_cmd(&temp_dir)
            .args(["run", "--once", "--dry-run"])
            .env("RSS_BOT_POLL_INTERVAL_SECS", "soon")
            .assert()
            .failure()
            .stderr(predicate::str::contains("RSS_BOT_POLL_INTERVAL_SECS"));
    }
}
