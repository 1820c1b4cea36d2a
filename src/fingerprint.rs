//! Preamble fingerprint.
//!
//! A client's connection preamble is reduced to four components, joined
//! with `|`:
//!
//! 1. every SETTINGS pair as `id:value`, comma-separated, in arrival order
//! 2. the last WINDOW_UPDATE increment, or `00` if none arrived
//! 3. every PRIORITY frame as `stream:exclusive:dependency:weight`, or `0`
//! 4. the letter after the colon of each pseudo-header, in header order
//!
//! The rendered identifier is [`FINGERPRINT_PREFIX`], then
//! [`FINGERPRINT_VERSION`], then the standard base64 of that string. The
//! layout is a compatibility contract and must not change.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::h2_codec::{PrioritySpec, SettingId};
use crate::hpack::H2Header;

/// Fixed GREASE-style lead-in: `"01"` ten times.
pub const FINGERPRINT_PREFIX: &str = "01010101010101010101";

/// Format version tag following the prefix.
pub const FINGERPRINT_VERSION: &str = "b3";

const NO_WINDOW_UPDATE: &str = "00";
const NO_PRIORITY: &str = "0";

/// Accumulates the fingerprint inputs seen on one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintBuilder {
    settings: Vec<String>,
    window_update: Option<u32>,
    priorities: Vec<String>,
    pseudo_headers: Vec<char>,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_settings(&mut self, settings: &[(SettingId, u32)]) {
        self.settings
            .extend(settings.iter().map(|(id, value)| format!("{}:{}", id.code(), value)));
    }

    /// Later updates replace earlier ones.
    pub fn observe_window_update(&mut self, increment: u32) {
        self.window_update = Some(increment);
    }

    /// The dependency is rendered as the whole wire word, so an exclusive
    /// dependency on stream 3 reads `2147483651`.
    pub fn observe_priority(&mut self, stream_id: u32, priority: &PrioritySpec) {
        self.priorities.push(format!(
            "{}:{}:{}:{}",
            stream_id,
            u8::from(priority.exclusive),
            priority.dependency_word(),
            priority.weight
        ));
    }

    /// Records the first character after `:` of every pseudo-header.
    ///
    /// Distinct pseudo-headers sharing that character collapse to the same
    /// code. A bare `:` contributes nothing.
    pub fn observe_headers(&mut self, headers: &[H2Header]) {
        self.pseudo_headers.extend(
            headers
                .iter()
                .filter(|h| h.is_pseudo())
                .filter_map(|h| h.name.chars().nth(1)),
        );
    }

    /// The `|`-joined plain-text form, before encoding.
    pub fn raw(&self) -> String {
        let window_update = self
            .window_update
            .map_or_else(|| NO_WINDOW_UPDATE.to_string(), |v| v.to_string());
        let priorities = if self.priorities.is_empty() {
            NO_PRIORITY.to_string()
        } else {
            self.priorities.join(",")
        };
        let pseudo_headers = self
            .pseudo_headers
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(",");

        [self.settings.join(","), window_update, priorities, pseudo_headers].join("|")
    }

    /// Render the final identifier.
    pub fn build(&self) -> String {
        encode(&self.raw())
    }
}

/// Wrap a raw fingerprint in the prefix, version tag and base64 body.
pub fn encode(raw: &str) -> String {
    format!(
        "{}{}{}",
        FINGERPRINT_PREFIX,
        FINGERPRINT_VERSION,
        STANDARD.encode(raw.as_bytes())
    )
}
