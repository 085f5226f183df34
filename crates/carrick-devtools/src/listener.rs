//! Event listener collaborator interface.

use serde_json::Value;

use crate::client::DevToolsClient;
use crate::error::DevToolsError;
use crate::timeout::Deadline;

/// Receives connection, event, and command-completion notifications from a
/// [`DevToolsClient`].
///
/// Listeners implement only the capabilities they care about; every method
/// defaults to `Ok(())`. Callbacks run synchronously on the pumping thread
/// and may issue further commands on the client they are handed -- the
/// engine supports reentrant sends.
pub trait DevToolsEventListener {
    /// Called once per connection epoch, after the bootstrap handshake and
    /// before any event of that epoch reaches this listener.
    fn on_connected(&self, _client: &dyn DevToolsClient) -> Result<(), DevToolsError> {
        Ok(())
    }

    /// Called for every inbound event, in listener registration order.
    fn on_event(
        &self,
        _client: &dyn DevToolsClient,
        _method: &str,
        _params: &Value,
    ) -> Result<(), DevToolsError> {
        Ok(())
    }

    /// Called when a command completes successfully, before the waiter is
    /// released. `deadline` bounds any follow-up commands issued from the
    /// callback.
    fn on_command_success(
        &self,
        _client: &dyn DevToolsClient,
        _method: &str,
        _result: &Value,
        _deadline: &Deadline,
    ) -> Result<(), DevToolsError> {
        Ok(())
    }
}
