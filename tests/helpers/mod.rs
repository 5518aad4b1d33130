
use reachwatch::config::Config;
use std::path::Path;

/// Returns a config suitable for driving the app against mocks: required
/// fields filled with placeholders and the snapshot kept under `state_dir`.
pub fn test_config(state_dir: &Path, channels: &[&str], chat_ids: &[i64]) -> Config {
    let mut config = Config::default();
    config.feed.gateway_url = "http://gateway.invalid".to_string();
    config.feed.api_token = "test-token".to_string();
    config.feed.channels = channels.iter().map(|c| c.to_string()).collect();
    config.notify.bot_token = "test-bot-token".to_string();
    config.notify.chat_ids = chat_ids.to_vec();
    config.state.path = state_dir.join("notified_posts.json");
    config
}
