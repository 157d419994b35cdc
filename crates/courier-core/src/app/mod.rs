//! App - アプリケーション層
//!
//! ports を組み合わせて、1 件のタスクを受信から報告まで処理します。
//!
//! # 主要コンポーネント
//! - **validator**: 期待ステータスとの比較
//! - **Executor**: HttpCommand を 1 回だけ実行
//! - **Dispatcher**: 解釈 → 実行 → 判定
//! - **Reporter**: started / completed / failed と運用通知
//! - **WorkerLoop / WorkerGroup**: 受信ループと複数ワーカーの管理
//! - **WorkerBuilder**: ワイヤリング

pub mod builder;
pub mod dispatcher;
pub mod executor;
pub mod reporter;
pub mod validator;
pub mod worker_loop;

pub use self::builder::{BuildError, WorkerBuilder};
pub use self::dispatcher::Dispatcher;
pub use self::executor::Executor;
pub use self::reporter::Reporter;
pub use self::validator::validate;
pub use self::worker_loop::{WorkerGroup, WorkerLoop};
