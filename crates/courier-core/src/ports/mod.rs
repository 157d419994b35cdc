//! Ports - 抽象化レイヤー
//!
//! core が外の世界（メッセージバス、ネットワーク）に触れる境界を trait で定義します。
//! テストでは InMemoryTransport / ScriptedHttpClient に差し替えます。

pub mod http_client;
pub mod transport;

pub use self::http_client::{HttpClient, HttpRequest};
pub use self::transport::Transport;
