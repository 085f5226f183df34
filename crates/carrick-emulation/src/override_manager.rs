//! Re-applies device-metrics overrides as the page lifecycle churns.

use serde_json::Value;

use carrick_devtools::{DevToolsClient, DevToolsError, DevToolsEventListener};

use crate::device_metrics::DeviceMetrics;

/// Keeps a mobile-emulation override in force on a DevTools client.
///
/// Register it as a listener: the override is applied when the client
/// connects and re-applied whenever the top-level frame navigates, since
/// navigation can reset emulation state in the renderer. The manager holds
/// no client reference; every entry point receives the client it should
/// talk to.
pub struct MobileEmulationOverrideManager {
    device_metrics: DeviceMetrics,
}

impl MobileEmulationOverrideManager {
    pub fn new(device_metrics: DeviceMetrics) -> Self {
        Self { device_metrics }
    }

    pub fn device_metrics(&self) -> &DeviceMetrics {
        &self.device_metrics
    }

    pub fn is_emulating_touch(&self) -> bool {
        self.device_metrics.touch
    }

    /// Re-apply the override on demand (e.g. after a higher layer knows the
    /// renderer state was clobbered).
    pub fn restore(&self, client: &dyn DevToolsClient) -> Result<(), DevToolsError> {
        self.apply_override(client)
    }

    fn apply_override(&self, client: &dyn DevToolsClient) -> Result<(), DevToolsError> {
        let metrics = &self.device_metrics;
        tracing::debug!(
            client = client.id(),
            width = metrics.width,
            height = metrics.height,
            "applying device metrics override"
        );
        client.send_command(
            "Page.setDeviceMetricsOverride",
            build_metrics_params(metrics),
        )?;

        if metrics.touch {
            client.send_command(
                "Emulation.setTouchEmulationEnabled",
                serde_json::json!({ "enabled": true }),
            )?;
        }
        Ok(())
    }
}

impl DevToolsEventListener for MobileEmulationOverrideManager {
    fn on_connected(&self, client: &dyn DevToolsClient) -> Result<(), DevToolsError> {
        self.apply_override(client)
    }

    fn on_event(
        &self,
        client: &dyn DevToolsClient,
        method: &str,
        params: &Value,
    ) -> Result<(), DevToolsError> {
        if method == "Page.frameNavigated" {
            // Only top-level frames reset the override; subframes carry a
            // parent id.
            let is_subframe = params
                .get("frame")
                .and_then(|frame| frame.get("parentId"))
                .is_some();
            if !is_subframe {
                return self.apply_override(client);
            }
        }
        Ok(())
    }
}

/// Build `Page.setDeviceMetricsOverride` parameters for `metrics`.
pub fn build_metrics_params(metrics: &DeviceMetrics) -> Value {
    serde_json::json!({
        "width": metrics.width,
        "height": metrics.height,
        "deviceScaleFactor": metrics.device_scale_factor,
        "mobile": metrics.mobile,
        "fitWindow": metrics.fit_window,
        "textAutosizing": metrics.text_autosizing,
        "fontScaleFactor": metrics.font_scale_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use serde_json::json;

    /// Records every command sent through it.
    #[derive(Default)]
    struct RecordingClient {
        commands: RefCell<Vec<(String, Value)>>,
    }

    impl DevToolsClient for RecordingClient {
        fn id(&self) -> &str {
            "recording"
        }

        fn session_id(&self) -> &str {
            ""
        }

        fn next_message_id(&self) -> u64 {
            1
        }

        fn connect_if_necessary(&self) -> Result<(), DevToolsError> {
            Ok(())
        }

        fn add_listener(&self, _listener: Rc<dyn carrick_devtools::DevToolsEventListener>) {}

        fn handle_events_until(
            &self,
            _predicate: &mut dyn FnMut() -> Result<bool, DevToolsError>,
            _timeout: Duration,
        ) -> Result<(), DevToolsError> {
            Ok(())
        }

        fn handle_received_events(&self) -> Result<(), DevToolsError> {
            Ok(())
        }

        fn send_command(&self, method: &str, params: Value) -> Result<(), DevToolsError> {
            self.commands.borrow_mut().push((method.to_string(), params));
            Ok(())
        }

        fn send_command_and_get_result(
            &self,
            method: &str,
            params: Value,
        ) -> Result<Value, DevToolsError> {
            self.send_command(method, params)?;
            Ok(json!({}))
        }

        fn send_command_and_ignore_response(
            &self,
            method: &str,
            params: Value,
        ) -> Result<(), DevToolsError> {
            self.send_command(method, params)
        }
    }

    fn touch_metrics() -> DeviceMetrics {
        DeviceMetrics::new(360, 640, 2.0, true, true)
    }

    #[test]
    fn test_build_metrics_params() {
        let params = build_metrics_params(&touch_metrics());
        assert_eq!(params["width"], 360);
        assert_eq!(params["height"], 640);
        assert_eq!(params["deviceScaleFactor"], 2.0);
        assert_eq!(params["mobile"], true);
        assert_eq!(params["fitWindow"], false);
        assert_eq!(params["textAutosizing"], true);
        assert_eq!(params["fontScaleFactor"], 1.0);
    }

    #[test]
    fn test_on_connected_applies_override_and_touch() {
        let client = RecordingClient::default();
        let manager = MobileEmulationOverrideManager::new(touch_metrics());

        manager.on_connected(&client).unwrap();

        let commands = client.commands.borrow();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].0, "Page.setDeviceMetricsOverride");
        assert_eq!(commands[1].0, "Emulation.setTouchEmulationEnabled");
        assert_eq!(commands[1].1, json!({ "enabled": true }));
    }

    #[test]
    fn test_no_touch_command_without_touch() {
        let client = RecordingClient::default();
        let manager =
            MobileEmulationOverrideManager::new(DeviceMetrics::new(800, 600, 1.0, false, false));

        manager.on_connected(&client).unwrap();

        let commands = client.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].0, "Page.setDeviceMetricsOverride");
    }

    #[test]
    fn test_top_level_navigation_reapplies_override() {
        let client = RecordingClient::default();
        let manager = MobileEmulationOverrideManager::new(touch_metrics());

        manager
            .on_event(
                &client,
                "Page.frameNavigated",
                &json!({ "frame": { "id": "F1" } }),
            )
            .unwrap();

        assert!(!client.commands.borrow().is_empty());
    }

    #[test]
    fn test_subframe_navigation_is_ignored() {
        let client = RecordingClient::default();
        let manager = MobileEmulationOverrideManager::new(touch_metrics());

        manager
            .on_event(
                &client,
                "Page.frameNavigated",
                &json!({ "frame": { "id": "F2", "parentId": "F1" } }),
            )
            .unwrap();

        assert!(client.commands.borrow().is_empty());
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let client = RecordingClient::default();
        let manager = MobileEmulationOverrideManager::new(touch_metrics());

        manager
            .on_event(&client, "Page.loadEventFired", &json!({}))
            .unwrap();

        assert!(client.commands.borrow().is_empty());
    }

    #[test]
    fn test_restore_reapplies() {
        let client = RecordingClient::default();
        let manager = MobileEmulationOverrideManager::new(touch_metrics());

        manager.restore(&client).unwrap();

        assert_eq!(client.commands.borrow()[0].0, "Page.setDeviceMetricsOverride");
    }
}
