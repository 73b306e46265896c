//! RemoteDevice - Device Cloud Session over W3C WebDriver
//!
//! Device operations are sent as `mobile:*` commands through WebDriver's
//! script endpoint, the way device clouds expose them:
//!
//! ```text
//! POST {hub}/session/{id}/execute/sync
//! {"script": "mobile:device:rotate", "args": [{"state": "landscape"}]}
//! ```
//!
//! Screenshots use the standard `GET {hub}/session/{id}/screenshot`. All
//! calls block; the HTTP timeout comes from [`SessionConfig::command_timeout`].

use crate::config::SessionConfig;
use crate::driver::{DeviceDriver, RepositoryPath, Rotation, Screenshot};
use crate::gesture::ScreenPoint;
use crate::location::{Coordinates, LocationSpec};
use crate::result::{DeviceError, DeviceResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A named device cloud command with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MobileCommand {
    /// Command name, e.g. `mobile:location:set`
    pub name: &'static str,
    /// Parameters object
    pub params: Map<String, Value>,
}

impl MobileCommand {
    /// Command without parameters
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Map::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Body for the execute endpoint
    #[must_use]
    pub fn body(&self) -> Value {
        json!({ "script": self.name, "args": [Value::Object(self.params.clone())] })
    }

    /// Rotate
    #[must_use]
    pub fn rotate(rotation: Rotation) -> Self {
        let (mode, target) = rotation.param();
        Self::new("mobile:device:rotate").param(mode, target)
    }

    /// Set location
    #[must_use]
    pub fn set_location(location: &LocationSpec) -> Self {
        Self::new("mobile:location:set").param(location.kind(), location.value())
    }

    /// Swipe
    #[must_use]
    pub fn swipe(start: &ScreenPoint, end: &ScreenPoint) -> Self {
        Self::new("mobile:touch:swipe")
            .param("start", start.to_string())
            .param("end", end.to_string())
    }

    /// Lock the screen
    #[must_use]
    pub fn lock(duration: Duration) -> Self {
        Self::new("mobile:screen:lock").param("timeout", duration.as_secs())
    }

    /// Return to the home screen
    #[must_use]
    pub fn go_home() -> Self {
        Self::new("mobile:handset:ready").param("target", "All")
    }

    /// Set the timezone
    #[must_use]
    pub fn set_timezone(timezone: &str) -> Self {
        Self::new("mobile:timezone:set").param("timezone", timezone)
    }

    /// Save a screenshot to the repository
    #[must_use]
    pub fn save_screenshot(path: &RepositoryPath) -> Self {
        Self::new("mobile:screen:image").param("key", path.as_str())
    }

    /// Hide the keyboard
    #[must_use]
    pub fn hide_keyboard() -> Self {
        Self::new("mobile:keyboard:display").param("mode", "off")
    }
}

/// Device session on a remote device cloud
#[derive(Debug)]
pub struct RemoteDevice {
    client: Client,
    hub: String,
    session_id: String,
    closed: bool,
}

impl RemoteDevice {
    /// Open a session with the configured capabilities
    pub fn connect(config: &SessionConfig) -> DeviceResult<Self> {
        let hub = config.hub_url()?.to_string();
        let client = Client::builder().timeout(config.timeout()).build()?;
        let caps = Value::Object(config.session_capabilities());
        let body = json!({
            "capabilities": { "alwaysMatch": caps },
            "desiredCapabilities": caps,
        });

        info!(%hub, "opening device session");
        let payload = send(client.post(format!("{hub}/session")).json(&body), "new session")?;
        let session_id = session_id_from(&payload).ok_or_else(|| DeviceError::Session {
            message: "hub response has no sessionId".to_string(),
        })?;
        info!(%session_id, "device session opened");

        Ok(Self {
            client,
            hub,
            session_id,
            closed: false,
        })
    }

    /// Session id assigned by the hub
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.hub, self.session_id)
    }

    /// Run a mobile command and return its `value`
    pub fn execute(&self, command: &MobileCommand) -> DeviceResult<Value> {
        if self.closed {
            return Err(DeviceError::Session {
                message: "session is closed".to_string(),
            });
        }
        debug!(command = command.name, params = ?command.params, "executing mobile command");
        let request = self
            .client
            .post(self.session_url("/execute/sync"))
            .json(&command.body());
        send(request, command.name)
    }

    fn execute_unit(&self, command: &MobileCommand) -> DeviceResult<()> {
        self.execute(command).map(|_| ())
    }

    fn execute_string(&self, command: &MobileCommand) -> DeviceResult<String> {
        match self.execute(command)? {
            Value::String(s) => Ok(s),
            other => Err(DeviceError::driver(
                command.name,
                format!("expected a string result, got {other}"),
            )),
        }
    }
}

impl DeviceDriver for RemoteDevice {
    fn rotate(&mut self, rotation: Rotation) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::rotate(rotation))
    }

    fn set_location(&mut self, location: &LocationSpec) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::set_location(location))
    }

    fn location(&mut self) -> DeviceResult<Coordinates> {
        let command = MobileCommand::new("mobile:location:get");
        let raw = self.execute_string(&command)?;
        Coordinates::parse(&raw).map_err(|e| DeviceError::driver(command.name, e.to_string()))
    }

    fn reset_location(&mut self) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::new("mobile:location:reset"))
    }

    fn go_home(&mut self) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::go_home())
    }

    fn swipe(&mut self, start: &ScreenPoint, end: &ScreenPoint) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::swipe(start, end))
    }

    fn lock(&mut self, duration: Duration) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::lock(duration))
    }

    fn set_timezone(&mut self, timezone: &str) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::set_timezone(timezone))
    }

    fn timezone(&mut self) -> DeviceResult<String> {
        self.execute_string(&MobileCommand::new("mobile:timezone:get"))
    }

    fn reset_timezone(&mut self) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::new("mobile:timezone:reset"))
    }

    fn screenshot(&mut self) -> DeviceResult<Screenshot> {
        let payload = send(self.client.get(self.session_url("/screenshot")), "screenshot")?;
        let encoded = payload.as_str().ok_or_else(|| DeviceError::Screenshot {
            message: "screenshot response is not a string".to_string(),
        })?;
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DeviceError::Screenshot {
                message: format!("invalid base64 image: {e}"),
            })?;
        Ok(Screenshot::new(data))
    }

    fn save_screenshot(&mut self, path: &RepositoryPath) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::save_screenshot(path))
    }

    fn hide_keyboard(&mut self) -> DeviceResult<()> {
        self.execute_unit(&MobileCommand::hide_keyboard())
    }

    fn close(&mut self) -> DeviceResult<()> {
        if self.closed {
            return Ok(());
        }
        info!(session_id = %self.session_id, "closing device session");
        self.closed = true;
        send(self.client.delete(self.session_url("")), "delete session").map(|_| ())
    }
}

impl Drop for RemoteDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close device session");
        }
    }
}

fn send(request: RequestBuilder, command: &str) -> DeviceResult<Value> {
    let response = request.send()?;
    let status = response.status();
    let text = response.text()?;
    let payload = serde_json::from_str::<Value>(&text);
    if !status.is_success() {
        return Err(match payload {
            Ok(payload) => error_from_payload(command, status.as_u16(), &payload),
            Err(_) => DeviceError::driver(command, format!("HTTP {status}")),
        });
    }
    Ok(payload?.get("value").cloned().unwrap_or(Value::Null))
}

/// Session id from a W3C (`value.sessionId`) or legacy (`sessionId`) response
fn session_id_from(payload: &Value) -> Option<String> {
    payload
        .pointer("/value/sessionId")
        .or_else(|| payload.get("sessionId"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Map a WebDriver error body to a device error
fn error_from_payload(command: &str, status: u16, payload: &Value) -> DeviceError {
    let error = payload
        .pointer("/value/error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = payload
        .pointer("/value/message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match error {
        "unsupported operation" | "unknown command" => DeviceError::Unsupported {
            command: command.to_string(),
        },
        "invalid session id" | "session not created" => DeviceError::Session {
            message: format!("{error}: {message}"),
        },
        _ => DeviceError::driver(command, format!("HTTP {status} {error}: {message}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod command_tests {
        use super::*;

        #[test]
        fn test_rotate_commands() {
            let cmd = MobileCommand::rotate(Rotation::Landscape);
            assert_eq!(cmd.name, "mobile:device:rotate");
            assert_eq!(cmd.params["state"], "landscape");

            let cmd = MobileCommand::rotate(Rotation::Next);
            assert_eq!(cmd.params["operation"], "next");
            assert!(!cmd.params.contains_key("state"));
        }

        #[test]
        fn test_location_commands() {
            let coords = Coordinates::parse("43.642659,-79.38705").unwrap();
            let cmd = MobileCommand::set_location(&LocationSpec::Coordinates(coords));
            assert_eq!(cmd.params["coordinates"], "43.642659,-79.38705");

            let cmd = MobileCommand::set_location(&LocationSpec::Address("Toronto".into()));
            assert_eq!(cmd.params["address"], "Toronto");
        }

        #[test]
        fn test_swipe_command() {
            let cmd =
                MobileCommand::swipe(&ScreenPoint::percent(60, 50), &ScreenPoint::percent(10, 50));
            assert_eq!(cmd.name, "mobile:touch:swipe");
            assert_eq!(cmd.params["start"], "60%,50%");
            assert_eq!(cmd.params["end"], "10%,50%");
        }

        #[test]
        fn test_lock_command_seconds() {
            let cmd = MobileCommand::lock(Duration::from_secs(0));
            assert_eq!(cmd.params["timeout"], 0);
        }

        #[test]
        fn test_screenshot_key() {
            let path = RepositoryPath::new("PRIVATE:dir1/dir2/name.png").unwrap();
            let cmd = MobileCommand::save_screenshot(&path);
            assert_eq!(cmd.name, "mobile:screen:image");
            assert_eq!(cmd.params["key"], "PRIVATE:dir1/dir2/name.png");
        }

        #[test]
        fn test_execute_body_shape() {
            let body = MobileCommand::hide_keyboard().body();
            assert_eq!(body["script"], "mobile:keyboard:display");
            assert_eq!(body["args"][0]["mode"], "off");
        }
    }

    mod payload_tests {
        use super::*;

        #[test]
        fn test_session_id_w3c() {
            let payload = json!({"value": {"sessionId": "abc", "capabilities": {}}});
            assert_eq!(session_id_from(&payload).as_deref(), Some("abc"));
        }

        #[test]
        fn test_session_id_legacy() {
            let payload = json!({"sessionId": "legacy", "status": 0, "value": {}});
            assert_eq!(session_id_from(&payload).as_deref(), Some("legacy"));
        }

        #[test]
        fn test_session_id_missing() {
            assert!(session_id_from(&json!({"value": null})).is_none());
        }

        #[test]
        fn test_error_mapping() {
            let unsupported =
                json!({"value": {"error": "unsupported operation", "message": "no lock"}});
            assert!(matches!(
                error_from_payload("mobile:screen:lock", 500, &unsupported),
                DeviceError::Unsupported { .. }
            ));

            let gone = json!({"value": {"error": "invalid session id", "message": "expired"}});
            assert!(matches!(
                error_from_payload("x", 404, &gone),
                DeviceError::Session { .. }
            ));

            let other = json!({"value": {"error": "javascript error", "message": "boom"}});
            let err = error_from_payload("mobile:location:set", 500, &other);
            let msg = err.to_string();
            assert!(msg.contains("mobile:location:set"));
            assert!(msg.contains("boom"));
        }

        #[test]
        fn test_connect_requires_url() {
            let err = RemoteDevice::connect(&SessionConfig::new()).unwrap_err();
            assert!(matches!(err, DeviceError::Config { .. }));
        }
    }

    /// Minimal WebDriver hub on a loopback socket, one request per connection
    mod hub {
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::{TcpListener, TcpStream};
        use std::sync::{Arc, Mutex};
        use std::thread;

        #[derive(Debug, Clone)]
        pub struct Request {
            pub method: String,
            pub path: String,
            pub body: String,
        }

        pub struct StubHub {
            pub url: String,
            requests: Arc<Mutex<Vec<Request>>>,
        }

        impl StubHub {
            pub fn start(
                handler: impl Fn(&Request) -> (u16, String) + Send + Sync + 'static,
            ) -> Self {
                let listener = TcpListener::bind("127.0.0.1:0").unwrap();
                let url = format!("http://{}/wd/hub", listener.local_addr().unwrap());
                let requests = Arc::new(Mutex::new(Vec::new()));
                let recorded = Arc::clone(&requests);
                thread::spawn(move || {
                    for stream in listener.incoming() {
                        let Ok(stream) = stream else { break };
                        serve(stream, &handler, &recorded);
                    }
                });
                Self { url, requests }
            }

            pub fn requests(&self) -> Vec<Request> {
                self.requests.lock().unwrap().clone()
            }
        }

        fn serve(
            mut stream: TcpStream,
            handler: &impl Fn(&Request) -> (u16, String),
            recorded: &Mutex<Vec<Request>>,
        ) {
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let mut parts = line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let path = parts.next().unwrap_or_default().to_string();

            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let request = Request {
                method,
                path,
                body: String::from_utf8(body).unwrap(),
            };
            let (status, payload) = handler(&request);
            recorded.lock().unwrap().push(request);

            let content_type = if payload.starts_with('<') {
                "text/html"
            } else {
                "application/json"
            };
            let response = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: {content_type}\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                payload.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    }

    mod transport_tests {
        use super::hub::{Request, StubHub};
        use super::*;

        fn ok(value: Value) -> (u16, String) {
            (200, json!({ "value": value }).to_string())
        }

        fn script_of(request: &Request) -> String {
            let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            body["script"].as_str().unwrap_or_default().to_string()
        }

        /// Session create and delete, everything else from `execute`
        fn stub_hub(
            execute: impl Fn(&Request) -> (u16, String) + Send + Sync + 'static,
        ) -> StubHub {
            StubHub::start(move |request| {
                match (request.method.as_str(), request.path.as_str()) {
                    ("POST", "/wd/hub/session") => {
                        ok(json!({"sessionId": "s-1", "capabilities": {}}))
                    }
                    ("DELETE", "/wd/hub/session/s-1") => ok(Value::Null),
                    _ => execute(request),
                }
            })
        }

        fn connect(hub: &StubHub) -> RemoteDevice {
            let config = SessionConfig::new()
                .remote_url(hub.url.clone())
                .security_token("tok")
                .capability("platformName", "Android")
                .command_timeout(5);
            RemoteDevice::connect(&config).unwrap()
        }

        #[test]
        fn test_connect_creates_session() {
            let hub = stub_hub(|_| ok(Value::Null));
            let device = connect(&hub);
            assert_eq!(device.session_id(), "s-1");

            let requests = hub.requests();
            let body: Value = serde_json::from_str(&requests[0].body).unwrap();
            assert_eq!(body["capabilities"]["alwaysMatch"]["platformName"], "Android");
            assert_eq!(body["capabilities"]["alwaysMatch"]["securityToken"], "tok");
        }

        #[test]
        fn test_connect_without_session_id() {
            let hub = StubHub::start(|_| ok(json!({"capabilities": {}})));
            let config = SessionConfig::new().remote_url(hub.url.clone());
            let err = RemoteDevice::connect(&config).unwrap_err();
            assert!(matches!(err, DeviceError::Session { .. }));
        }

        #[test]
        fn test_mobile_command_is_posted() {
            let hub = stub_hub(|_| ok(Value::Null));
            let mut device = connect(&hub);
            device.rotate(Rotation::Landscape).unwrap();

            let request = hub.requests()[1].clone();
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/wd/hub/session/s-1/execute/sync");
            let body: Value = serde_json::from_str(&request.body).unwrap();
            assert_eq!(body["script"], "mobile:device:rotate");
            assert_eq!(body["args"][0]["state"], "landscape");
        }

        #[test]
        fn test_location_reply_is_parsed() {
            let hub = stub_hub(|request| match script_of(request).as_str() {
                "mobile:location:get" => ok(json!("43.642659,-79.38705")),
                _ => ok(Value::Null),
            });
            let mut device = connect(&hub);
            let location = device.location().unwrap();
            assert!(location.matches(&Coordinates::parse("43.642659,-79.38705").unwrap()));
        }

        #[test]
        fn test_malformed_location_reply() {
            let hub = stub_hub(|_| ok(json!("somewhere")));
            let mut device = connect(&hub);
            let err = device.location().unwrap_err();
            assert!(matches!(err, DeviceError::Driver { ref command, .. }
                if command == "mobile:location:get"));
        }

        #[test]
        fn test_non_string_reply() {
            let hub = stub_hub(|_| ok(json!({"zone": "UTC"})));
            let mut device = connect(&hub);
            let err = device.timezone().unwrap_err();
            assert!(err.to_string().contains("expected a string result"));
        }

        #[test]
        fn test_screenshot_is_decoded() {
            let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
            let encoded = STANDARD.encode(&png);
            let hub = stub_hub(move |request| {
                if request.method == "GET" && request.path.ends_with("/screenshot") {
                    ok(json!(encoded.clone()))
                } else {
                    ok(Value::Null)
                }
            });
            let mut device = connect(&hub);
            let screenshot = device.screenshot().unwrap();
            assert_eq!(screenshot.data, png);
            assert!(screenshot.is_png());
        }

        #[test]
        fn test_screenshot_invalid_base64() {
            let hub = stub_hub(|_| ok(json!("%%% not base64 %%%")));
            let mut device = connect(&hub);
            let err = device.screenshot().unwrap_err();
            assert!(matches!(err, DeviceError::Screenshot { .. }));
        }

        #[test]
        fn test_error_bodies_are_mapped() {
            let hub = stub_hub(|request| {
                let (status, error) = match script_of(request).as_str() {
                    "mobile:screen:lock" => (500, "unsupported operation"),
                    "mobile:timezone:get" => (404, "invalid session id"),
                    _ => (500, "javascript error"),
                };
                let body = json!({"value": {"error": error, "message": "stub"}});
                (status, body.to_string())
            });
            let mut device = connect(&hub);

            let err = device.lock(Duration::from_secs(1)).unwrap_err();
            assert!(matches!(err, DeviceError::Unsupported { .. }));
            let err = device.timezone().unwrap_err();
            assert!(matches!(err, DeviceError::Session { .. }));
            let err = device.go_home().unwrap_err();
            assert!(matches!(err, DeviceError::Driver { .. }));
        }

        #[test]
        fn test_html_error_page_keeps_status_and_command() {
            let hub = stub_hub(|_| (502, "<html>Bad Gateway</html>".to_string()));
            let mut device = connect(&hub);
            let err = device.hide_keyboard().unwrap_err();
            let msg = err.to_string();
            assert!(matches!(err, DeviceError::Driver { .. }));
            assert!(msg.contains("mobile:keyboard:display"));
            assert!(msg.contains("502"));
        }

        #[test]
        fn test_close_is_idempotent() {
            let hub = stub_hub(|_| ok(Value::Null));
            let mut device = connect(&hub);
            device.close().unwrap();
            device.close().unwrap();
            assert!(matches!(
                device.swipe(&ScreenPoint::percent(1, 1), &ScreenPoint::percent(2, 2)),
                Err(DeviceError::Session { .. })
            ));
            drop(device);

            let deletes = hub
                .requests()
                .iter()
                .filter(|r| r.method == "DELETE")
                .count();
            assert_eq!(deletes, 1);
        }

        #[test]
        fn test_drop_closes_session() {
            let hub = stub_hub(|_| ok(Value::Null));
            let device = connect(&hub);
            drop(device);

            let last = hub.requests().pop().unwrap();
            assert_eq!(last.method, "DELETE");
            assert_eq!(last.path, "/wd/hub/session/s-1");
        }
    }
}
