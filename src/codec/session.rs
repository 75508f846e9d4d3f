/// Session bookkeeping for outgoing SD messages.
///
/// Session IDs start at 1 and wrap from 0xFFFF to 1 (0 is skipped). The reboot
/// flag stays set from startup until the session ID wraps for the first time.
#[derive(Debug, Clone)]
pub struct SdSessionCounter {
    // NEXT session ID to hand out
    next: u16,
    rebooted: bool,
}

impl SdSessionCounter {
    pub fn new() -> Self {
        SdSessionCounter { next: 1, rebooted: true }
    }

    /// Session ID and reboot flag the next message will carry, without consuming them.
    pub fn peek(&self) -> (u16, bool) {
        (self.next, self.rebooted)
    }

    /// Returns the session ID and reboot flag to stamp on the next message.
    pub fn next_session(&mut self) -> (u16, bool) {
        let (current, reboot) = self.peek();
        if current == 0xFFFF {
            self.next = 1;
            self.rebooted = false;
        } else {
            self.next = current + 1;
        }
        (current, reboot)
    }

    pub fn reboot_flag(&self) -> bool {
        self.rebooted
    }
}

impl Default for SdSessionCounter {
    fn default() -> Self {
        Self::new()
    }
}
