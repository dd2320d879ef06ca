//! Recovery after a device reboot.
//!
//! When the device reports a reboot it has forgotten the client. Recovery
//! re-requests configuration with the reserved minimal nonce. The request
//! goes out directly and is not correlated with any consumer report, so an
//! in-flight report is left alone; its completion will not match and is
//! handled by the normal completion path.

use crate::report::Nonce;
use radio_schema::OutboundEnvelope;
use tracing::info;

/// Reboot bookkeeping
#[derive(Debug, Clone, Default)]
pub struct RebootRecovery {
    reboots: u32,
}

impl RebootRecovery {
    /// Create recovery state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reboot and return the envelope to send
    pub fn on_reboot(&mut self) -> OutboundEnvelope {
        self.reboots = self.reboots.saturating_add(1);
        info!("Radio rebooted ({} so far), requesting configuration", self.reboots);
        OutboundEnvelope::WantConfig(Nonce::MINIMAL.get())
    }

    /// Reboots seen since startup
    pub fn reboots(&self) -> u32 {
        self.reboots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reboot_requests_minimal_config() {
        let mut recovery = RebootRecovery::new();
        assert_eq!(recovery.on_reboot(), OutboundEnvelope::WantConfig(69_420));
        assert_eq!(recovery.on_reboot(), OutboundEnvelope::WantConfig(69_420));
        assert_eq!(recovery.reboots(), 2);
    }
}
