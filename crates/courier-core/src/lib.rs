//! courier-core
//!
//! Message-bus driven worker that performs one outbound HTTP request per task
//! and reports the result back to the caller.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, outcome, report, errors, envelope）
//! - **ports**: 抽象化レイヤー（Transport, HttpClient）
//! - **app**: アプリケーションロジック（dispatcher, reporter, worker_loop, builder など）
//! - **impls**: 実装（ReqwestClient, InMemoryTransport, ScriptedHttpClient）
//! - **config** / **observability**: 設定とログ・カウンタ

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use crate::app::{WorkerBuilder, WorkerGroup, WorkerLoop};
pub use crate::config::{NotifyConfig, WorkerConfig};
