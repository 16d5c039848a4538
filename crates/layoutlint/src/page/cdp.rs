//! Chromium pages over the Chrome DevTools Protocol.
//!
//! Each page gets [`RUNTIME_SCRIPT`] installed after every navigation; all
//! [`Page`] operations except `evaluate` are calls into that runtime.

use super::{Page, Scope, ScopeSpec, ScrollPosition};
use crate::config::{ResetPolicy, ViewportSize};
use crate::message::Location;
use crate::primitives::interactive_selector;
use crate::result::{LinterError, LinterResult};
use crate::snapshot::{ElementId, LayoutSnapshot, COLLECTED_PROPERTIES, HIT_SAMPLE_GRID};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// In-page runtime: element registry, snapshot collector, selector finder
/// and ignore matcher
pub const RUNTIME_SCRIPT: &str = include_str!("runtime.js");

const RUNTIME_VERSION: u32 = 1;

const CALL_SHIM: &str = "(op, args) => window.__layoutLint \
    ? window.__layoutLint.call(op, args) \
    : { error: { kind: 'environment', message: 'layout runtime is not installed' } }";

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Page viewport
    pub viewport: ViewportSize,
    /// Path to the chromium binary (`None` = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// What `reset` does between rules with side effects
    pub reset: ResetPolicy,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: ViewportSize::default(),
            chromium_path: None,
            sandbox: true,
            reset: ResetPolicy::default(),
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, viewport: ViewportSize) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the reset policy
    #[must_use]
    pub const fn with_reset(mut self, reset: ResetPolicy) -> Self {
        self.reset = reset;
        self
    }
}

/// A running chromium instance
#[derive(Debug)]
pub struct Browser {
    config: BrowserConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch chromium
    pub async fn launch(config: BrowserConfig) -> LinterResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport.width, config.viewport.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| LinterError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| LinterError::BrowserLaunch {
                    message: e.to_string(),
                })?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!(headless = config.headless, "browser launched");

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Browser configuration
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Open a new page on `url` with the runtime installed
    pub async fn open(&self, url: &str) -> LinterResult<ChromiumPage> {
        let inner = {
            let browser = self.inner.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| LinterError::page(e.to_string()))?
        };
        let viewport = self.config.viewport;
        inner
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                1.0,
                false,
            ))
            .await
            .map_err(|e| LinterError::page(e.to_string()))?;

        let mut page = ChromiumPage {
            inner,
            url: url.to_string(),
            reset: self.config.reset,
        };
        page.navigate(url).await?;
        Ok(page)
    }

    /// Close the browser
    pub async fn close(self) -> LinterResult<()> {
        let mut browser = self.inner.lock().await;
        browser
            .close()
            .await
            .map_err(|e| LinterError::page(e.to_string()))?;
        self.handle.abort();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Error(Fault),
}

#[derive(Debug, Deserialize)]
struct Fault {
    kind: String,
    message: String,
}

impl From<Fault> for LinterError {
    fn from(fault: Fault) -> Self {
        match fault.kind.as_str() {
            "environment" => Self::environment(fault.message),
            "invalid-scope" => Self::InvalidScope {
                selector: fault.message,
            },
            "unknown-element" => match fault.message.parse() {
                Ok(id) => Self::UnknownElement { id },
                Err(_) => Self::page(fault.message),
            },
            _ => Self::page(fault.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResolvedScope {
    id: u32,
    roots: Vec<ElementId>,
}

/// A chromium tab
#[derive(Debug)]
pub struct ChromiumPage {
    inner: CdpPage,
    url: String,
    reset: ResetPolicy,
}

impl ChromiumPage {
    /// Navigate and install the runtime
    pub async fn navigate(&mut self, url: &str) -> LinterResult<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| LinterError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.url = self
            .inner
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        self.install().await
    }

    async fn install(&mut self) -> LinterResult<()> {
        let config = json!({
            "version": RUNTIME_VERSION,
            "properties": COLLECTED_PROPERTIES,
            "interactiveSelector": interactive_selector(),
            "grid": HIT_SAMPLE_GRID,
        });
        self.evaluate(RUNTIME_SCRIPT, config)
            .await
            .map_err(|e| LinterError::environment(format!("runtime install failed: {e}")))?;
        trace!(url = %self.url, "runtime installed");
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&mut self, op: &str, args: Value) -> LinterResult<T> {
        let expression = format!("({CALL_SHIM})({}, {args})", Value::from(op));
        let result = self
            .inner
            .evaluate_expression(expression)
            .await
            .map_err(|e| LinterError::evaluation(e.to_string()))?;
        let reply: Reply = serde_json::from_value(result.value().cloned().unwrap_or(Value::Null))?;
        match reply {
            Reply::Ok(value) => Ok(serde_json::from_value(value)?),
            Reply::Error(fault) => Err(fault.into()),
        }
    }
}

#[async_trait]
impl Page for ChromiumPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn evaluate(&mut self, script: &str, arg: Value) -> LinterResult<Value> {
        let expression = format!("({script})({arg})");
        let result = self
            .inner
            .evaluate_expression(expression)
            .await
            .map_err(|e| LinterError::evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn resolve_scope(&mut self, spec: &ScopeSpec) -> LinterResult<Scope> {
        let selector = match spec {
            ScopeSpec::Document => Value::Null,
            ScopeSpec::Selector(s) => Value::from(s.as_str()),
        };
        let resolved: ResolvedScope = self
            .call("resolveScope", json!({ "selector": selector }))
            .await?;
        Ok(Scope {
            id: resolved.id,
            spec: spec.clone(),
            roots: resolved.roots,
        })
    }

    async fn dispose_scope(&mut self, scope: Scope) -> LinterResult<()> {
        self.call::<Value>("disposeScope", json!({ "id": scope.id }))
            .await
            .map(|_| ())
    }

    async fn snapshot(&mut self, scope: &Scope) -> LinterResult<LayoutSnapshot> {
        self.call("snapshot", json!({ "scope": scope.id })).await
    }

    async fn scroll_position(&mut self) -> LinterResult<ScrollPosition> {
        self.call("scrollPosition", Value::Null).await
    }

    async fn scroll_to(&mut self, position: ScrollPosition) -> LinterResult<()> {
        self.call::<Value>("scrollTo", json!({ "x": position.x, "y": position.y }))
            .await
            .map(|_| ())
    }

    async fn reset(&mut self) -> LinterResult<()> {
        match self.reset {
            ResetPolicy::Reload => {
                self.inner
                    .reload()
                    .await
                    .map_err(|e| LinterError::Navigation {
                        url: self.url.clone(),
                        message: e.to_string(),
                    })?;
                self.install().await
            }
            ResetPolicy::None => self
                .call::<Value>("releaseScopes", Value::Null)
                .await
                .map(|_| ()),
        }
    }

    async fn resolve_locations(&mut self, elements: &[ElementId]) -> LinterResult<Vec<Location>> {
        self.call("locate", json!({ "elements": elements })).await
    }

    async fn ignored_selectors(
        &mut self,
        selectors: &[String],
        rule_id: &str,
        attribute: &str,
    ) -> LinterResult<HashSet<String>> {
        let matched: Vec<String> = self
            .call(
                "ignored",
                json!({ "selectors": selectors, "ruleId": rule_id, "attribute": attribute }),
            )
            .await?;
        Ok(matched.into_iter().collect())
    }

    async fn close(&mut self) -> LinterResult<()> {
        self.inner
            .clone()
            .close()
            .await
            .map_err(|e| LinterError::page(e.to_string()))
    }
}
