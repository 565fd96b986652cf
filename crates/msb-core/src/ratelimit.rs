use std::collections::HashMap;

use crate::domain::UserId;

/// Per-sender command cooldown.
///
/// Each entry holds the earliest epoch second at which the sender may run
/// another command. Entries are overwritten, never removed.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    window_secs: i64,
    next_allowed: HashMap<UserId, i64>,
}

impl RateLimiter {
    pub fn new(window_secs: i64) -> Self {
        Self {
            window_secs,
            next_allowed: HashMap::new(),
        }
    }

    pub fn allow(&mut self, sender: &UserId, is_exempt: bool) -> bool {
        self.allow_at(sender, is_exempt, chrono::Utc::now().timestamp())
    }

    /// Exempt senders always pass but still have their window refreshed.
    /// A suppressed call has no side effect.
    pub fn allow_at(&mut self, sender: &UserId, is_exempt: bool, now: i64) -> bool {
        if !is_exempt {
            if let Some(&next) = self.next_allowed.get(sender) {
                if next > now {
                    return false;
                }
            }
        }

        self.next_allowed
            .insert(sender.clone(), now + self.window_secs);
        true
    }

    pub fn next_allowed(&self, sender: &UserId) -> Option<i64> {
        self.next_allowed.get(sender).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId(s.to_string())
    }

    #[test]
    fn second_command_inside_window_is_suppressed() {
        let mut rl = RateLimiter::new(5);
        let u = user("@bob:example.org");

        assert!(rl.allow_at(&u, false, 1_000));
        assert!(!rl.allow_at(&u, false, 1_001));
        // Suppressed call does not extend the window.
        assert_eq!(rl.next_allowed(&u), Some(1_005));
        assert!(rl.allow_at(&u, false, 1_005));
        assert_eq!(rl.next_allowed(&u), Some(1_010));
    }

    #[test]
    fn exempt_sender_is_never_blocked_but_tracked() {
        let mut rl = RateLimiter::new(5);
        let me = user("@me:example.org");

        for t in 0..10 {
            assert!(rl.allow_at(&me, true, 1_000 + t));
        }
        assert_eq!(rl.next_allowed(&me), Some(1_014));
    }

    #[test]
    fn senders_are_independent() {
        let mut rl = RateLimiter::new(60);
        assert!(rl.allow_at(&user("@a:x"), false, 0));
        assert!(rl.allow_at(&user("@b:x"), false, 0));
        assert!(!rl.allow_at(&user("@a:x"), false, 30));
    }
}
