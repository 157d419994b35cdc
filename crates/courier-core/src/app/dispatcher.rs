//! Dispatcher - タスクを解釈して実行し、結果を判定する
//!
//! # フロー
//! 1. `HttpTask::parse`（subcommand / 必須フィールド / base64 / code の検査）
//! 2. `Executor::execute`（ネットワーク）
//! 3. `validate`（期待ステータスとの比較）
//!
//! 1 で失敗した場合、ネットワークには一切出ない。

use crate::app::executor::Executor;
use crate::app::validator::validate;
use crate::domain::{DispatchError, HttpTask, RequestOutcome, TaskMessage};

#[derive(Clone)]
pub struct Dispatcher {
    executor: Executor,
}

impl Dispatcher {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn dispatch(&self, message: &TaskMessage) -> Result<RequestOutcome, DispatchError> {
        let task = HttpTask::parse(message)?;
        let observed = self.executor.execute(&task.command).await?;
        validate(observed, task.expected_code)?;
        Ok(RequestOutcome::as_expected(task.command.verb(), observed))
    }
}
