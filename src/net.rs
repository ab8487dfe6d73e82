// Copyright 2025 StormWatch Desktop Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared networking plumbing for the feed clients.

use reqwest::blocking::Client;

/// Identifies the app to NWS and Nominatim, both of which require a UA.
pub const USER_AGENT: &str = "stormwatch-desktop/0.1 (github.com/stormwatch/stormwatch-desktop)";

/// Build the blocking client used by all one-shot feed requests.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Per-target request sequence guard.
///
/// Overlapping fetches for the same target are never cancelled; instead each
/// issue gets a monotonically increasing number and only the response carrying
/// the latest issued number is applied. Everything older is discarded on
/// arrival, so an out-of-order response can never clobber newer data.
#[derive(Debug, Default)]
pub struct SeqGuard {
    issued: u64,
}

impl SeqGuard {
    /// Reserve the next sequence number for an outgoing request.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a response with `seq` is the latest issued for this target.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_guard_discards_stale_response() {
        let mut guard = SeqGuard::default();
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn test_seq_guard_accepts_only_latest() {
        let mut guard = SeqGuard::default();
        let seq = guard.issue();
        assert!(guard.is_current(seq));
        // A later issue supersedes it even before the response lands.
        guard.issue();
        assert!(!guard.is_current(seq));
    }
}
