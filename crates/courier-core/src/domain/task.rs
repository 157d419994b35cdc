//! Task - 受信メッセージと、それを解釈した HTTP コマンド
//!
//! # 二層構造
//! - **TaskMessage**: バスから来た JSON の `parameters` 部分（全フィールド optional）
//! - **HttpTask / HttpCommand**: 検証済み。動詞ごとの variant に必要なフィールドだけを持つ
//!
//! 未知の subcommand は `HttpTask::parse` で弾かれるので、executor には届かない。

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::errors::{DispatchError, ValidationError};

/// Expected status when the task carries no `code`.
pub const DEFAULT_EXPECTED_CODE: u16 = 200;

/// Key of the object that holds the task fields in a bus body.
const PARAMETERS_KEY: &str = "parameters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    /// Case-sensitive lookup of a subcommand name.
    pub fn from_subcommand(s: &str) -> Option<Self> {
        match s {
            "Get" => Some(Verb::Get),
            "Put" => Some(Verb::Put),
            "Post" => Some(Verb::Post),
            "Delete" => Some(Verb::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "Get",
            Verb::Put => "Put",
            Verb::Post => "Post",
            Verb::Delete => "Delete",
        }
    }

    /// HTTP method name.
    pub fn method(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status code as callers hand it over: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeValue {
    Number(i64),
    Text(String),
}

impl CodeValue {
    /// JSON の number / string を受け取る。それ以外は Text にして resolve で弾く
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(n) => CodeValue::Number(n),
                None => CodeValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => CodeValue::Text(s.clone()),
            other => CodeValue::Text(other.to_string()),
        }
    }

    /// Coerce to an integer status code.
    pub fn resolve(&self) -> Result<u16, ValidationError> {
        let n = match self {
            CodeValue::Number(n) => *n,
            CodeValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidCode(s.clone()))?,
        };
        u16::try_from(n).map_err(|_| ValidationError::InvalidCode(self.to_string()))
    }
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeValue::Number(n) => n.fmt(f),
            CodeValue::Text(s) => s.fmt(f),
        }
    }
}

impl From<u16> for CodeValue {
    fn from(n: u16) -> Self {
        CodeValue::Number(i64::from(n))
    }
}

impl From<i32> for CodeValue {
    fn from(n: i32) -> Self {
        CodeValue::Number(i64::from(n))
    }
}

impl From<i64> for CodeValue {
    fn from(n: i64) -> Self {
        CodeValue::Number(n)
    }
}

impl From<&str> for CodeValue {
    fn from(s: &str) -> Self {
        CodeValue::Text(s.to_string())
    }
}

impl From<String> for CodeValue {
    fn from(s: String) -> Self {
        CodeValue::Text(s)
    }
}

/// Task fields as they arrive on the bus.
///
/// バス上の body は `{"parameters": {"command": "httprequest", "subcommand": ..}}`。
/// `parameters` が無い body はフィールドがトップレベルにあるものとして読む。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Routing name of the worker (`httprequest`). Not checked here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(
        rename = "contenttype",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(rename = "b64encoded", default, skip_serializing_if = "Option::is_none")]
    pub is_base64: Option<bool>,

    /// int or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
}

impl TaskMessage {
    /// Decode a raw bus body, unwrapping `parameters` when present.
    pub fn from_slice(body: &[u8]) -> Result<Self, DispatchError> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(malformed)?;
        let fields = match value {
            serde_json::Value::Object(mut map) => match map.remove(PARAMETERS_KEY) {
                Some(parameters) => parameters,
                None => serde_json::Value::Object(map),
            },
            other => {
                return Err(DispatchError::MalformedMessage(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };
        serde_json::from_value(fields).map_err(malformed)
    }
}

fn malformed(e: serde_json::Error) -> DispatchError {
    DispatchError::MalformedMessage(e.to_string())
}

/// Body attached to Put / Post, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestBody {
    /// Decode `content` according to the `b64encoded` flag.
    ///
    /// base64 は改行で折り返されて届くことがあるので、ASCII 空白は読み飛ばす。
    pub fn decode(
        content_type: String,
        content: &str,
        is_base64: bool,
    ) -> Result<Self, DispatchError> {
        let bytes = if is_base64 {
            let compact: Vec<u8> = content
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact)
                .map_err(|e| DispatchError::InvalidEncoding(e.to_string()))?
        } else {
            content.as_bytes().to_vec()
        };
        Ok(Self {
            content_type,
            bytes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpCommand {
    Get { url: String },
    Put { url: String, body: RequestBody },
    Post { url: String, body: RequestBody },
    Delete { url: String },
}

impl HttpCommand {
    pub fn verb(&self) -> Verb {
        match self {
            HttpCommand::Get { .. } => Verb::Get,
            HttpCommand::Put { .. } => Verb::Put,
            HttpCommand::Post { .. } => Verb::Post,
            HttpCommand::Delete { .. } => Verb::Delete,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            HttpCommand::Get { url }
            | HttpCommand::Put { url, .. }
            | HttpCommand::Post { url, .. }
            | HttpCommand::Delete { url } => url,
        }
    }

    pub fn body(&self) -> Option<&RequestBody> {
        match self {
            HttpCommand::Put { body, .. } | HttpCommand::Post { body, .. } => Some(body),
            HttpCommand::Get { .. } | HttpCommand::Delete { .. } => None,
        }
    }
}

impl fmt::Display for HttpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb().method(), self.url())?;
        if let Some(body) = self.body() {
            write!(f, " ({}, {} bytes)", body.content_type, body.bytes.len())?;
        }
        Ok(())
    }
}

/// A validated task, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTask {
    pub command: HttpCommand,
    pub expected_code: u16,
}

impl HttpTask {
    /// Validate a message. Nothing here touches the network.
    ///
    /// 検査順: subcommand → url → contenttype → content → (base64) → code
    pub fn parse(message: &TaskMessage) -> Result<Self, DispatchError> {
        let verb = message
            .subcommand
            .as_deref()
            .and_then(Verb::from_subcommand)
            .ok_or(DispatchError::NoSubcommand)?;

        let url = required(&message.url, "url")?;

        let command = match verb {
            Verb::Get => HttpCommand::Get { url },
            Verb::Delete => HttpCommand::Delete { url },
            Verb::Put => HttpCommand::Put {
                url,
                body: body_from(message)?,
            },
            Verb::Post => HttpCommand::Post {
                url,
                body: body_from(message)?,
            },
        };

        let expected_code = match &message.code {
            None | Some(serde_json::Value::Null) => DEFAULT_EXPECTED_CODE,
            Some(value) => CodeValue::from_json(value).resolve()?,
        };

        Ok(Self {
            command,
            expected_code,
        })
    }
}

fn body_from(message: &TaskMessage) -> Result<RequestBody, DispatchError> {
    let content_type = required(&message.content_type, "contenttype")?;
    let content = required(&message.content, "content")?;
    RequestBody::decode(content_type, &content, message.is_base64.unwrap_or(false))
}

// 空文字列も未指定と同じ扱い
fn required(field: &Option<String>, name: &'static str) -> Result<String, DispatchError> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(DispatchError::MissingInput(name)),
    }
}
