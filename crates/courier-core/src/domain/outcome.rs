//! RequestOutcome - 1 回の HTTP 実行の結果
//!
//! Dispatcher が作り、Reporter が `completed` report の data として使う。
//! 作成後は変更しない。

use serde::{Deserialize, Serialize};

use super::task::Verb;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Subcommand that ran.
    pub verb: Verb,
    pub observed_status_code: u16,
    pub summary: String,
}

impl RequestOutcome {
    /// The observed status matched the expected one.
    pub fn as_expected(verb: Verb, observed_status_code: u16) -> Self {
        Self {
            verb,
            observed_status_code,
            summary: format!("URL returned {observed_status_code} as expected."),
        }
    }
}
