use super::evaluate::{Evaluate, evaluate_as};
use super::scripts::Script;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

/// Endpoints tried when the configured WebDriver URL refuses a session
const FALLBACK_WEBDRIVER_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Polling interval while waiting for network idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exclusively owned browser tab bound to one target URL
///
/// Call [`PageSession::close`] when done.
pub struct PageSession {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkProbe {
    ready_state: String,
    resources: u64,
}

/// Opens a browser session, loads `url` and drives the page to a settled state.
///
/// The protocol is: navigate and wait for network idle (bounded by
/// `timeout_ms`), pause for late scripts, sweep-scroll the document to
/// trigger lazy loading, then return to the top and pause again.
pub async fn settle(
    config: &HarvestConfig,
    url: &str,
    timeout_ms: u64,
) -> Result<PageSession, HarvestError> {
    let client = connect_to_webdriver(config).await?;
    let session = PageSession {
        client,
        url: url.to_string(),
    };

    match session.drive(config, timeout_ms).await {
        Ok(()) => Ok(session),
        Err(e) => {
            session.close().await;
            Err(e)
        }
    }
}

impl PageSession {
    /// URL the session was opened for
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ends the WebDriver session, logging rather than returning failures
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close browser session for {}: {}", self.url, e);
        } else {
            ::log::debug!("Closed browser session for {}", self.url);
        }
    }

    async fn drive(&self, config: &HarvestConfig, timeout_ms: u64) -> Result<(), HarvestError> {
        let budget = Duration::from_millis(timeout_ms);

        if let Err(e) = self
            .client
            .set_window_size(config.viewport_width, config.viewport_height)
            .await
        {
            ::log::warn!("Could not set window size: {}", e);
        }

        let scroll_budget = Duration::from_millis(
            config.scroll_interval_ms * u64::from(config.max_scroll_steps),
        ) + Duration::from_secs(10);
        let timeouts =
            TimeoutConfiguration::new(Some(scroll_budget.max(budget)), Some(budget), None);
        if let Err(e) = self.client.update_timeouts(timeouts).await {
            ::log::warn!("Could not set WebDriver timeouts: {}", e);
        }

        ::log::info!("Navigating to {}", self.url);
        let started = Instant::now();
        match timeout(budget, self.load(config, timeout_ms)).await {
            Ok(result) => result?,
            Err(_) => {
                ::log::error!("Timeout loading: {}", self.url);
                return Err(HarvestError::NavigationTimeout {
                    url: self.url.clone(),
                    timeout_ms,
                });
            }
        }
        ::log::debug!(
            "Network idle on {} after {:.2} seconds",
            self.url,
            started.elapsed().as_secs_f64()
        );

        sleep(Duration::from_millis(config.settle_delay_ms)).await;
        auto_scroll(self, config).await;
        sleep(Duration::from_millis(config.post_scroll_delay_ms)).await;

        ::log::info!("Page settled: {}", self.url);
        Ok(())
    }

    async fn load(&self, config: &HarvestConfig, timeout_ms: u64) -> Result<(), HarvestError> {
        if let Err(e) = self.client.goto(&self.url).await {
            return Err(classify_navigation_error(&e.to_string(), &self.url, timeout_ms));
        }
        if !wait_for_network_idle(self, Duration::from_millis(config.network_idle_ms)).await {
            ::log::warn!("Not waiting for network idle on {}", self.url);
        }
        Ok(())
    }
}

/// Waits until the document is complete and no new resources have started
/// loading for `quiet`. The caller bounds the total wait.
///
/// Returns `false` when the probe itself fails; the page is then treated as
/// loaded.
pub(crate) async fn wait_for_network_idle<E: Evaluate>(page: &E, quiet: Duration) -> bool {
    let mut last_count = None;
    let mut quiet_since = Instant::now();

    loop {
        let probe: NetworkProbe = match evaluate_as(page, Script::NetworkProbe, vec![]).await {
            Ok(probe) => probe,
            Err(e) => {
                ::log::warn!("Network probe failed: {}", e);
                return false;
            }
        };

        if last_count != Some(probe.resources) {
            last_count = Some(probe.resources);
            quiet_since = Instant::now();
        } else if probe.ready_state == "complete" && quiet_since.elapsed() >= quiet {
            return true;
        }

        sleep(IDLE_POLL_INTERVAL).await;
    }
}

/// Sweeps the document top to bottom to trigger lazy loading, then returns
/// to the top. Failures are logged only.
pub(crate) async fn auto_scroll<E: Evaluate>(page: &E, config: &HarvestConfig) {
    let args = vec![
        json!(config.scroll_step_px),
        json!(config.scroll_interval_ms),
        json!(config.max_scroll_steps),
    ];
    match page.evaluate(Script::AutoScroll, args).await {
        Ok(steps) => ::log::debug!("Auto-scroll finished after {} steps", steps),
        Err(e) => ::log::warn!("Auto-scroll failed: {}", e),
    }

    if let Err(e) = page.evaluate(Script::ScrollTop, vec![]).await {
        ::log::warn!("Could not scroll back to top: {}", e);
    }
}

impl Evaluate for PageSession {
    async fn evaluate(&self, script: Script, args: Vec<Value>) -> Result<Value, HarvestError> {
        let source = script.source();
        let result = if script.is_async() {
            self.client.execute_async(&source, args).await
        } else {
            self.client.execute(&source, args).await
        };

        result.map_err(|e| HarvestError::Script {
            script: script.name(),
            reason: e.to_string(),
        })
    }

    async fn page_source(&self) -> Result<String, HarvestError> {
        self.client
            .source()
            .await
            .map_err(|e| HarvestError::Script {
                script: "page-source",
                reason: e.to_string(),
            })
    }
}

/// Maps a driver-reported navigation failure onto the error taxonomy
fn classify_navigation_error(message: &str, url: &str, timeout_ms: u64) -> HarvestError {
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        HarvestError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms,
        }
    } else {
        HarvestError::NavigationError {
            url: url.to_string(),
            reason: message.to_string(),
        }
    }
}

/// WebDriver capabilities for an isolated desktop-sized session
fn capabilities(config: &HarvestConfig) -> serde_json::Map<String, Value> {
    let mut chrome_args = vec![
        format!(
            "--window-size={},{}",
            config.viewport_width, config.viewport_height
        ),
        format!("--user-agent={}", config.user_agent),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
    ];
    let mut firefox_args = Vec::new();
    if config.headless {
        chrome_args.insert(0, "--headless=new".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": chrome_args }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "general.useragent.override": config.user_agent }
        }),
    );
    caps
}

/// Connects to the configured WebDriver, falling back to well-known local endpoints
async fn connect_to_webdriver(config: &HarvestConfig) -> Result<Client, HarvestError> {
    let caps = capabilities(config);

    let mut last_error = match try_connect(&config.webdriver_url, &caps).await {
        Ok(client) => return Ok(client),
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == config.webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        match try_connect(url, &caps).await {
            Ok(client) => return Ok(client),
            Err(e) => last_error = e,
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(HarvestError::Session(last_error))
}

async fn try_connect(url: &str, caps: &serde_json::Map<String, Value>) -> Result<Client, String> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps.clone());
    match builder.connect(url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", url);
            Ok(client)
        }
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::tests::FakePage;

    fn probe(ready_state: &str, resources: u64) -> Value {
        json!({ "readyState": ready_state, "resources": resources })
    }

    #[test]
    fn test_classify_timeout_messages() {
        let err = classify_navigation_error(
            "timeout: Timed out receiving message from renderer: 4.981",
            "https://example.com",
            5000,
        );
        assert!(err.is_timeout());

        let err = classify_navigation_error(
            "unknown error: net::ERR_NAME_NOT_RESOLVED",
            "https://nope.invalid",
            5000,
        );
        assert!(matches!(err, HarvestError::NavigationError { .. }));
    }

    #[test]
    fn test_capabilities_carry_viewport_and_agent() {
        let config = HarvestConfig::default();
        let caps = capabilities(&config);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();

        assert_eq!(args[0], "--headless=new");
        assert!(args.iter().any(|a| a == "--window-size=1920,1080"));
        assert!(
            args.iter()
                .any(|a| a.as_str().unwrap().starts_with("--user-agent=Mozilla/5.0"))
        );
        assert_eq!(
            caps["moz:firefoxOptions"]["prefs"]["general.useragent.override"],
            config.user_agent
        );
    }

    #[test]
    fn test_headful_capabilities() {
        let config = HarvestConfig {
            headless: false,
            ..HarvestConfig::default()
        };
        let caps = capabilities(&config);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
        assert!(caps["moz:firefoxOptions"]["args"].as_array().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_resources_restart_quiet_period() {
        let page = FakePage::new().with_sequence(
            Script::NetworkProbe,
            vec![
                probe("interactive", 1),
                probe("interactive", 2),
                probe("complete", 2),
            ],
        );

        let started = Instant::now();
        assert!(wait_for_network_idle(&page, Duration::from_millis(500)).await);

        // Count last changed on the second poll, 100ms in
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600), "idle after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(700), "idle after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_waits_for_complete_document() {
        let mut probes = vec![probe("loading", 4); 10];
        probes.push(probe("complete", 4));
        let page = FakePage::new().with_sequence(Script::NetworkProbe, probes);

        let started = Instant::now();
        assert!(wait_for_network_idle(&page, Duration::from_millis(500)).await);

        assert_eq!(page.calls().len(), 11);
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_probe_stops_waiting() {
        let page = FakePage::new();
        let started = Instant::now();
        assert!(!wait_for_network_idle(&page, Duration::from_millis(500)).await);
        assert_eq!(page.calls().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);

        let page = FakePage::new().with_script(Script::NetworkProbe, json!("not a probe"));
        assert!(!wait_for_network_idle(&page, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_auto_scroll_then_back_to_top() {
        let page = FakePage::new()
            .with_script(Script::AutoScroll, json!(42))
            .with_script(Script::ScrollTop, json!(true));
        let config = HarvestConfig {
            scroll_step_px: 250,
            max_scroll_steps: 20,
            ..HarvestConfig::default()
        };

        auto_scroll(&page, &config).await;

        let calls = page.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Script::AutoScroll);
        assert_eq!(calls[0].1, vec![json!(250), json!(100), json!(20)]);
        assert_eq!(calls[1].0, Script::ScrollTop);
    }

    #[tokio::test]
    async fn test_scroll_failure_still_returns_to_top() {
        let page = FakePage::new().with_script(Script::ScrollTop, json!(true));

        auto_scroll(&page, &HarvestConfig::default()).await;

        let scripts: Vec<Script> = page.calls().into_iter().map(|(script, _)| script).collect();
        assert_eq!(scripts, vec![Script::AutoScroll, Script::ScrollTop]);
    }

    /// Needs a running WebDriver (e.g. `chromedriver --port=4444`).
    #[tokio::test]
    #[ignore]
    async fn test_unreachable_host_times_out() {
        let config = HarvestConfig::default().with_env_overrides();
        // Non-routable address: the connection hangs instead of failing fast
        let result = settle(&config, "http://10.255.255.1/", 5000).await;
        match result {
            Err(e) => assert!(e.is_timeout(), "expected timeout, got {}", e),
            Ok(session) => {
                session.close().await;
                panic!("navigation to an unreachable host should not settle");
            }
        }
    }
}
