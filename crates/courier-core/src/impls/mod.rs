//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ReqwestClient**: 本番用の HttpClient
//! - **InMemoryTransport**: 開発・テスト用の Transport
//! - **ScriptedHttpClient**: ネットワークに出ない HttpClient（テスト・ドライラン用）
//!
//! 実際のメッセージバス（AMQP など）の Transport は別クレートに置く想定。

pub mod inmem_transport;
pub mod reqwest_client;
pub mod scripted_client;

pub use self::inmem_transport::{InMemoryTransport, SentReply};
pub use self::reqwest_client::ReqwestClient;
pub use self::scripted_client::ScriptedHttpClient;
