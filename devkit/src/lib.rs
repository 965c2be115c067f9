/*!
# HUD DevKit - Mocks and harness for the HUD kernel

Lets tests and tools drive the sync engine without a host or a renderer:
- `MockHostBridge`: records outbound host calls, scripted `getThemeColors` answers
- `RecordingStylePort`: captures every style command in application order
- `HudMessageBuilder`: `{action, data}` envelopes as the host sends them
- `TestHarness`: engine plus a manual clock, flushing outboxes like the runtime does
*/

pub mod messages;
pub mod mock_host;
pub mod test_utils;

pub use messages::HudMessageBuilder;
pub use mock_host::{MockHostBridge, RecordedCall, RecordingStylePort};
pub use test_utils::TestHarness;
