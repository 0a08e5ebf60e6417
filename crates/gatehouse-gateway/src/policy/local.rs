//! In-process evaluator: shield patterns, user-agent bot detection and a
//! per-(counter, IP) sliding window.
//!
//! Every rule runs on every request and all triggered signals are reported;
//! the adapter decides which one wins.
//!
//! The window map holds at most `max_buckets` entries. A new caller that
//! pushes it past the cap triggers a sweep: idle windows go first, then the
//! least recently hit ones until the map is back under the low-water mark.
//! Requests from already-tracked callers never scan the map.

use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::{BotCategory, LocalEvaluatorConfig};

use super::evaluator::{DecisionEvaluator, EvaluationRequest, EvaluatorError, Signal, Verdict};

const DEFAULT_MAX_BUCKETS: usize = 100_000;

const SHIELD_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    "..%2f",
    "%2e%2e",
    "<script",
    "%3cscript",
    "javascript:",
    "union select",
    "union%20select",
    "' or '1'='1",
    "%27%20or%20",
    "/etc/passwd",
    "/.env",
    "/.git/",
    "%00",
];

const SEARCH_ENGINE_AGENTS: &[&str] = &[
    "googlebot",
    "bingbot",
    "duckduckbot",
    "yandexbot",
    "baiduspider",
    "applebot",
    "slurp",
];

const PREVIEW_AGENTS: &[&str] = &[
    "slackbot",
    "facebookexternalhit",
    "twitterbot",
    "discordbot",
    "linkedinbot",
    "telegrambot",
    "whatsapp",
    "embedly",
];

const AUTOMATION_MARKERS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scraper",
    "curl/",
    "wget/",
    "python-requests",
    "python-urllib",
    "aiohttp",
    "go-http-client",
    "okhttp",
    "java/",
    "libwww-perl",
    "httpclient",
    "headless",
    "phantomjs",
    "selenium",
    "puppeteer",
    "playwright",
    "scrapy",
];

/// How a user-agent string classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentClass {
    Browser,
    Automated(Option<BotCategory>),
}

pub fn classify_agent(user_agent: &str) -> AgentClass {
    let ua = user_agent.trim().to_ascii_lowercase();
    if ua.is_empty() {
        return AgentClass::Automated(None);
    }
    if SEARCH_ENGINE_AGENTS.iter().any(|m| ua.contains(m)) {
        return AgentClass::Automated(Some(BotCategory::SearchEngine));
    }
    if PREVIEW_AGENTS.iter().any(|m| ua.contains(m)) {
        return AgentClass::Automated(Some(BotCategory::Preview));
    }
    if AUTOMATION_MARKERS.iter().any(|m| ua.contains(m)) {
        return AgentClass::Automated(None);
    }
    AgentClass::Browser
}

pub fn is_suspicious_path(path: &str) -> bool {
    let p = path.to_ascii_lowercase();
    SHIELD_PATTERNS.iter().any(|m| p.contains(m))
}

/// Trailing-window request log for one bucket.
#[derive(Debug)]
pub struct SlidingWindow {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(window: Duration) -> Self {
        Self { window, hits: VecDeque::new() }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.hits.front() {
            if now.duration_since(*front) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a hit if fewer than `max` fall inside the window.
    pub fn try_acquire(&mut self, now: Instant, window: Duration, max: u32) -> bool {
        self.window = window;
        self.prune(now);
        if self.hits.len() < max as usize {
            self.hits.push_back(now);
            true
        } else {
            false
        }
    }

    fn is_idle(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.hits.is_empty()
    }

    fn last_hit(&self) -> Option<Instant> {
        self.hits.back().copied()
    }
}

type WindowKey = (String, IpAddr);

pub struct LocalEvaluator {
    cfg: LocalEvaluatorConfig,
    allowed: HashSet<BotCategory>,
    windows: DashMap<WindowKey, SlidingWindow>,
    max_buckets: usize,
}

impl LocalEvaluator {
    pub fn new(cfg: LocalEvaluatorConfig) -> Self {
        Self {
            allowed: cfg.allowed_bot_categories.iter().copied().collect(),
            cfg,
            windows: DashMap::new(),
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }

    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets.max(1);
        self
    }

    pub fn bucket_count(&self) -> usize {
        self.windows.len()
    }

    fn is_disallowed_bot(&self, user_agent: &str) -> bool {
        match classify_agent(user_agent) {
            AgentClass::Browser => false,
            AgentClass::Automated(Some(cat)) => !self.allowed.contains(&cat),
            AgentClass::Automated(None) => true,
        }
    }

    fn check_window(&self, req: &EvaluationRequest) -> bool {
        let now = Instant::now();
        let (allowed, fresh) = match self.windows.entry((req.counter_name.clone(), req.ip)) {
            Entry::Occupied(mut slot) => {
                (slot.get_mut().try_acquire(now, req.window, req.max_requests), false)
            }
            Entry::Vacant(slot) => {
                let mut w = SlidingWindow::new(req.window);
                let ok = w.try_acquire(now, req.window, req.max_requests);
                slot.insert(w);
                (ok, true)
            }
        };

        if fresh && self.windows.len() > self.max_buckets {
            self.shrink(now);
        }
        allowed
    }

    /// Bring the map down to the low-water mark, idle windows first.
    fn shrink(&self, now: Instant) {
        let low_water = self.max_buckets - self.max_buckets / 10;

        self.windows.retain(|_, w| !w.is_idle(now));
        let idle_swept = self.windows.len();

        let excess = self.windows.len().saturating_sub(low_water);
        if excess > 0 {
            let mut by_age: Vec<(Instant, WindowKey)> = self
                .windows
                .iter()
                .map(|e| (e.value().last_hit().unwrap_or(now), e.key().clone()))
                .collect();
            by_age.sort_unstable_by_key(|(at, _)| *at);
            for (_, key) in by_age.into_iter().take(excess) {
                self.windows.remove(&key);
            }
        }

        tracing::debug!(
            after_idle_sweep = idle_swept,
            len = self.windows.len(),
            max = self.max_buckets,
            "local evaluator window map trimmed"
        );
    }
}

#[async_trait]
impl DecisionEvaluator for LocalEvaluator {
    async fn evaluate(&self, req: &EvaluationRequest) -> Result<Verdict, EvaluatorError> {
        let mut signals = Vec::new();

        if self.cfg.shield && is_suspicious_path(&req.path) {
            signals.push(Signal::Shield);
        }
        if self.cfg.bot_detection && self.is_disallowed_bot(&req.user_agent) {
            signals.push(Signal::Bot);
        }
        if !self.check_window(req) {
            signals.push(Signal::RateLimit);
        }

        if signals.is_empty() {
            Ok(Verdict::allow())
        } else {
            Ok(Verdict::deny(signals))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::evaluator::Conclusion;

    const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

    fn request(counter: &str, ua: &str, path: &str) -> EvaluationRequest {
        EvaluationRequest {
            ip: "198.51.100.4".parse().unwrap(),
            user_agent: ua.into(),
            path: path.into(),
            method: "GET".into(),
            window: Duration::from_secs(10),
            max_requests: 2,
            counter_name: counter.into(),
        }
    }

    #[test]
    fn agents_classify() {
        assert_eq!(classify_agent(BROWSER), AgentClass::Browser);
        assert_eq!(classify_agent(""), AgentClass::Automated(None));
        assert_eq!(classify_agent("curl/8.4.0"), AgentClass::Automated(None));
        assert_eq!(
            classify_agent("Mozilla/5.0 (compatible; Googlebot/2.1)"),
            AgentClass::Automated(Some(BotCategory::SearchEngine))
        );
        assert_eq!(
            classify_agent("Slackbot-LinkExpanding 1.0"),
            AgentClass::Automated(Some(BotCategory::Preview))
        );
    }

    #[test]
    fn shield_patterns() {
        assert!(is_suspicious_path("/api/../../etc/passwd"));
        assert!(is_suspicious_path("/search/%3Cscript%3E"));
        assert!(!is_suspicious_path("/api/users/42"));
    }

    #[tokio::test(start_paused = true)]
    async fn window_denies_then_recovers() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default());
        let req = request("guest-rate-limit", BROWSER, "/api");

        assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::allow());
        assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::allow());
        assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::deny(vec![Signal::RateLimit]));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::allow());
    }

    #[tokio::test(start_paused = true)]
    async fn counters_are_independent() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default());
        let guest = request("guest-rate-limit", BROWSER, "/api");
        let admin = request("admin-rate-limit", BROWSER, "/api");

        ev.evaluate(&guest).await.unwrap();
        ev.evaluate(&guest).await.unwrap();
        assert_eq!(ev.evaluate(&guest).await.unwrap().conclusion, Conclusion::Deny);
        assert_eq!(ev.evaluate(&admin).await.unwrap(), Verdict::allow());
        assert_eq!(ev.bucket_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn allowed_categories_pass_bot_detection() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default());
        let crawler = request("guest-rate-limit", "Googlebot/2.1", "/");
        assert_eq!(ev.evaluate(&crawler).await.unwrap(), Verdict::allow());

        let strict = LocalEvaluator::new(LocalEvaluatorConfig {
            allowed_bot_categories: Vec::new(),
            ..LocalEvaluatorConfig::default()
        });
        assert_eq!(strict.evaluate(&crawler).await.unwrap(), Verdict::deny(vec![Signal::Bot]));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_every_triggered_signal() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default());
        let req = request("guest-rate-limit", "", "/.env");
        let v = ev.evaluate(&req).await.unwrap();
        assert_eq!(v, Verdict::deny(vec![Signal::Shield, Signal::Bot]));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_rules_stay_quiet() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig {
            shield: false,
            bot_detection: false,
            allowed_bot_categories: Vec::new(),
        });
        let req = request("guest-rate-limit", "", "/.env");
        assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::allow());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_windows_are_swept() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default()).with_max_buckets(1);
        ev.evaluate(&request("guest-rate-limit", BROWSER, "/")).await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        ev.evaluate(&request("user-rate-limit", BROWSER, "/")).await.unwrap();
        assert_eq!(ev.bucket_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn window_map_stays_bounded_with_active_callers() {
        let ev = LocalEvaluator::new(LocalEvaluatorConfig::default()).with_max_buckets(10);
        for i in 0..1000u32 {
            let mut req = request("guest-rate-limit", BROWSER, "/api");
            req.ip = IpAddr::from([10, 0, (i / 256) as u8, (i % 256) as u8]);
            assert_eq!(ev.evaluate(&req).await.unwrap(), Verdict::allow());
            assert!(ev.bucket_count() <= 10, "{} buckets after caller {i}", ev.bucket_count());
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        // The most recent caller keeps its window.
        let mut last = request("guest-rate-limit", BROWSER, "/api");
        last.ip = IpAddr::from([10, 0, 3, 231]);
        assert_eq!(ev.evaluate(&last).await.unwrap(), Verdict::allow());
        assert_eq!(ev.evaluate(&last).await.unwrap(), Verdict::deny(vec![Signal::RateLimit]));
    }
}
