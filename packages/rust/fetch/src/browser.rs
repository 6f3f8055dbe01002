//! Headless-browser pool for the scripted fetch strategy.
//!
//! Browser instances are expensive, so a small fixed pool (default 2) is
//! checked out and returned rather than launched per request. Each instance
//! runs its CDP event handler on a background task. Non-essential
//! sub-resources (images, fonts, stylesheets) are blocked before navigation
//! to keep renders fast.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use pathweaver_shared::{PathweaverError, Result};

/// URL patterns blocked before every navigation.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.woff", "*.woff2",
    "*.ttf", "*.otf", "*.css",
];

/// Bounded pool of reusable headless-browser instances.
pub struct BrowserPool {
    config: pathweaver_shared::BrowserConfig,
    permits: Semaphore,
    idle: Mutex<Vec<Browser>>,
    attempts: AtomicU64,
}

impl BrowserPool {
    pub fn new(config: pathweaver_shared::BrowserConfig) -> Self {
        let permits = Semaphore::new(config.max_instances);
        Self {
            config,
            permits,
            idle: Mutex::new(Vec::new()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Total render attempts since construction, successful or not.
    pub fn render_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Navigate to `url` in a pooled browser and return the rendered HTML.
    ///
    /// Waits for a free instance when all are busy. Fails with
    /// [`PathweaverError::Browser`] when the pool is disabled or the
    /// browser cannot be launched.
    pub async fn render(&self, url: &str) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if !self.config.enabled {
            return Err(PathweaverError::Browser(
                "scripted strategy disabled by config".into(),
            ));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PathweaverError::Browser("browser pool closed".into()))?;

        let browser = match self.checkout() {
            Some(browser) => browser,
            None => self.launch().await?,
        };

        let result = self.render_with(&browser, url).await;

        match &result {
            // A healthy instance goes back to the pool; a failed one is
            // dropped so the next request launches fresh.
            Ok(_) => self.idle.lock().expect("pool mutex poisoned").push(browser),
            Err(e) => warn!(url, error = %e, "browser instance discarded after failure"),
        }

        result
    }

    fn checkout(&self) -> Option<Browser> {
        self.idle.lock().expect("pool mutex poisoned").pop()
    }

    async fn launch(&self) -> Result<Browser> {
        let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);

        if let Some(path) = &self.config.executable_path {
            builder = builder.chrome_executable(Path::new(path));
        }

        let browser_config = builder
            .build()
            .map_err(PathweaverError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PathweaverError::Browser(format!("launch failed: {e}")))?;

        // Drain CDP events until the browser goes away.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("launched headless browser instance");
        Ok(browser)
    }

    async fn render_with(&self, browser: &Browser, url: &str) -> Result<String> {
        let nav_timeout = Duration::from_secs(self.config.nav_timeout_secs);

        let render = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| PathweaverError::Browser(format!("new page failed: {e}")))?;

            let blocked: Vec<String> = BLOCKED_URL_PATTERNS.iter().map(|s| s.to_string()).collect();
            page.execute(SetBlockedUrLsParams::new(blocked))
                .await
                .map_err(|e| PathweaverError::Browser(format!("resource blocking failed: {e}")))?;

            page.goto(url)
                .await
                .map_err(|e| PathweaverError::Browser(format!("navigation failed: {e}")))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| PathweaverError::Browser(format!("navigation wait failed: {e}")))?;

            let html = page
                .content()
                .await
                .map_err(|e| PathweaverError::Browser(format!("content read failed: {e}")))?;

            let _ = page.close().await;
            Ok(html)
        };

        tokio::time::timeout(nav_timeout, render)
            .await
            .map_err(|_| PathweaverError::Browser(format!("navigation timed out for {url}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_pool_rejects_renders() {
        let pool = BrowserPool::new(pathweaver_shared::BrowserConfig {
            enabled: false,
            ..Default::default()
        });
        let err = pool.render("https://example.com").await.unwrap_err();
        assert!(matches!(err, PathweaverError::Browser(_)));
    }
}
