//! W3C WebDriver client backing [`UiEngine`].
//!
//! Speaks the wire protocol directly over HTTP; only the handful of endpoints
//! the sequencer needs are implemented. "No such element" responses map to
//! `EngineError::Structural` so absence never masquerades as a false
//! predicate.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::{EngineError, Key, Locator, PointerOffset, UiEngine};

/// W3C element identifier key in wire responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const DROP_PAYLOAD_SCRIPT: &str = r#"
const [selector, name, encoded] = arguments;
const target = document.querySelector(selector);
if (!target) {
    throw new Error(`drop target not found: ${selector}`);
}
const binary = atob(encoded);
const bytes = new Uint8Array(binary.length);
for (let i = 0; i < binary.length; i++) {
    bytes[i] = binary.charCodeAt(i);
}
const dt = new DataTransfer();
dt.items.add(new File([bytes], name, { type: "application/octet-stream" }));
target.dispatchEvent(new DragEvent("drop", { bubbles: true, dataTransfer: dt }));
"#;

#[derive(Debug, Deserialize)]
struct ElementRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// A single WebDriver session.
pub struct WebDriverEngine {
    http: reqwest::Client,
    endpoint: String,
    session: String,
}

impl WebDriverEngine {
    /// Open a session against a running WebDriver endpoint
    /// (e.g. chromedriver on `http://127.0.0.1:9515`).
    pub async fn connect(endpoint: &str, viewport: (u32, u32)) -> Result<Self, EngineError> {
        let http = reqwest::Client::new();
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": [format!("--window-size={},{}", viewport.0, viewport.1)],
                    },
                },
            },
        });
        let value = wire(
            &http,
            Method::POST,
            format!("{endpoint}/session"),
            Some(capabilities),
        )
        .await?;
        let session = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::Protocol("session response without sessionId".into()))?
            .to_string();
        tracing::info!(endpoint, session = %session, "webdriver session created");
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            session,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, EngineError> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session, path);
        wire(&self.http, method, url, body).await
    }

    async fn find_all(&self, css: &str) -> Result<Vec<String>, EngineError> {
        let value = self
            .send(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await?;
        let list = value
            .as_array()
            .ok_or_else(|| EngineError::Protocol("elements response is not an array".into()))?;
        list.iter()
            .map(|element| {
                element
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        EngineError::Protocol("element entry without an id".into())
                    })
            })
            .collect()
    }

    /// Resolve a locator to an element id, failing structurally when the
    /// index is out of range of the current matches.
    async fn find(&self, locator: &Locator) -> Result<String, EngineError> {
        let mut matches = self.find_all(&locator.css).await?;
        if locator.index >= matches.len() {
            return Err(EngineError::Structural(format!(
                "{locator} ({} matches)",
                matches.len()
            )));
        }
        Ok(matches.swap_remove(locator.index))
    }

    async fn rect(&self, element: &str) -> Result<ElementRect, EngineError> {
        let value = self
            .send(Method::GET, &format!("/element/{element}/rect"), None)
            .await?;
        serde_json::from_value(value)
            .map_err(|err| EngineError::Protocol(format!("malformed element rect: {err}")))
    }
}

#[async_trait]
impl UiEngine for WebDriverEngine {
    async fn open(&self, url: &str) -> Result<(), EngineError> {
        self.send(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(drop)
    }

    async fn count(&self, css: &str) -> Result<usize, EngineError> {
        Ok(self.find_all(css).await?.len())
    }

    async fn is_enabled(&self, locator: &Locator) -> Result<bool, EngineError> {
        let element = self.find(locator).await?;
        let value = self
            .send(Method::GET, &format!("/element/{element}/enabled"), None)
            .await?;
        value
            .as_bool()
            .ok_or_else(|| EngineError::Protocol("enabled response is not a boolean".into()))
    }

    async fn click(&self, locator: &Locator, at: Option<PointerOffset>) -> Result<(), EngineError> {
        let element = self.find(locator).await?;
        let Some(at) = at else {
            return self
                .send(Method::POST, &format!("/element/{element}/click"), Some(json!({})))
                .await
                .map(drop);
        };

        // Positional clicks go through the actions API: a viewport-relative
        // pointer move to the fractional offset of the element box, then a
        // press-release.
        let rect = self.rect(&element).await?;
        let x = (rect.x + rect.width * at.x).round() as i64;
        let y = (rect.y + rect.height * at.y).round() as i64;
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [
                    { "type": "pointerMove", "duration": 0, "origin": "viewport", "x": x, "y": y },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pointerUp", "button": 0 },
                ],
            }],
        });
        self.send(Method::POST, "/actions", Some(actions)).await?;
        self.send(Method::DELETE, "/actions", None).await.map(drop)
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        key_delay: Duration,
    ) -> Result<(), EngineError> {
        let element = self.find(locator).await?;
        for ch in text.chars() {
            self.send(
                Method::POST,
                &format!("/element/{element}/value"),
                Some(json!({ "text": ch.to_string() })),
            )
            .await?;
            tokio::time::sleep(key_delay).await;
        }
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, key: Key) -> Result<(), EngineError> {
        let element = self.find(locator).await?;
        self.send(
            Method::POST,
            &format!("/element/{element}/value"),
            Some(json!({ "text": key.wire_code() })),
        )
        .await
        .map(drop)
    }

    async fn run_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, EngineError> {
        self.send(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn drop_payload(
        &self,
        css: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.run_script(
            DROP_PAYLOAD_SCRIPT,
            vec![json!(css), json!(file_name), json!(encoded)],
        )
        .await
        .map(drop)
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.send(Method::DELETE, "", None).await?;
        tracing::info!(session = %self.session, "webdriver session closed");
        Ok(())
    }
}

async fn wire(
    http: &reqwest::Client,
    method: Method,
    url: String,
    body: Option<Value>,
) -> Result<Value, EngineError> {
    let mut request = http.request(method, url);
    if let Some(body) = &body {
        request = request.json(body);
    }
    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response.json().await?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let code = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(match code {
            "no such element" | "stale element reference" => {
                EngineError::Structural(format!("{code}: {message}"))
            }
            "javascript error" => EngineError::Script(message.to_string()),
            _ => EngineError::Protocol(format!("{code}: {message}")),
        });
    }
    Ok(value)
}
