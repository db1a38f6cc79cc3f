//! Contact and newsletter form endpoints.
//!
//! The generated site ships two PHP scripts (`contact.php`, `subscribe.php`)
//! that accept form posts on the web host. [`FormHandler`] implements the
//! same contract in Rust against a data directory, so the behaviour the
//! scripts promise is pinned down by tests here.
//!
//! ## Contract
//!
//! | Condition | Status | Error code |
//! |-----------|--------|------------|
//! | Method other than POST | 405 | `method_not_allowed` |
//! | Honeypot field `company` filled | 400 | `invalid_request` |
//! | Contact without name, email or message | 400 | `missing_fields` |
//! | Email not a valid address | 400 | `invalid_email` |
//! | Contact message over 4000 characters | 400 | `message_too_long` |
//! | Too many submissions from one identity within an hour | 429 | `rate_limited` |
//! | Data directory or files unusable | 500 | `storage_unavailable` |
//!
//! Success is `200 {"ok": true}`; every failure is `{"ok": false, "error": code}`.
//!
//! ## Storage
//!
//! ```text
//! data/
//! ├── .htaccess               # denies web access to csv/json
//! ├── ratelimit.json          # identity → accepted unix timestamps
//! ├── contact_messages.csv    # time, name, email, message, identity
//! └── newsletter_signups.csv  # time, email, identity
//! ```
//!
//! Both endpoints share `ratelimit.json`. The rate state is read, pruned and
//! rewritten while an exclusive lock is held; the accepted submission is then
//! appended as one CSV line under its own exclusive lock.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

pub const DATA_DIR: &str = "data";
pub const RATE_LIMIT_FILE: &str = "ratelimit.json";
pub const HTACCESS: &str = "Require all denied\n<FilesMatch \\.(csv|json)$>\n  Require all denied\n</FilesMatch>\n";

/// Length of the rate-limit window in seconds.
pub const WINDOW_SECS: i64 = 3600;
/// Longest accepted contact message, in characters.
pub const MESSAGE_LIMIT: usize = 4000;

/// Name of the honeypot field; humans never see it, bots fill it in.
pub const HONEYPOT_FIELD: &str = "company";

const CONTACT_PHP: &str = include_str!("../static/contact.php");
const SUBSCRIBE_PHP: &str = include_str!("../static/subscribe.php");

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && !email.contains("..") && EMAIL.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Newsletter,
}

impl FormKind {
    /// Accepted submissions per identity per window.
    pub fn limit(self) -> usize {
        match self {
            Self::Contact => 6,
            Self::Newsletter => 8,
        }
    }

    pub fn script_name(self) -> &'static str {
        match self {
            Self::Contact => "contact.php",
            Self::Newsletter => "subscribe.php",
        }
    }

    pub fn log_file(self) -> &'static str {
        match self {
            Self::Contact => "contact_messages.csv",
            Self::Newsletter => "newsletter_signups.csv",
        }
    }

    fn script(self) -> &'static str {
        match self {
            Self::Contact => CONTACT_PHP,
            Self::Newsletter => SUBSCRIBE_PHP,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("method_not_allowed")]
    MethodNotAllowed,
    #[error("invalid_request")]
    InvalidRequest,
    #[error("missing_fields")]
    MissingFields,
    #[error("invalid_email")]
    InvalidEmail,
    #[error("message_too_long")]
    MessageTooLong,
    #[error("rate_limited")]
    RateLimited,
    #[error("storage_unavailable")]
    StorageUnavailable,
}

impl FormError {
    pub fn status(self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::RateLimited => 429,
            Self::StorageUnavailable => 500,
            Self::InvalidRequest | Self::MissingFields | Self::InvalidEmail | Self::MessageTooLong => 400,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidRequest => "invalid_request",
            Self::MissingFields => "missing_fields",
            Self::InvalidEmail => "invalid_email",
            Self::MessageTooLong => "message_too_long",
            Self::RateLimited => "rate_limited",
            Self::StorageUnavailable => "storage_unavailable",
        }
    }
}

/// One incoming request: HTTP method, client identity and form fields.
#[derive(Debug, Clone)]
pub struct Submission {
    pub method: String,
    pub identity: String,
    pub fields: BTreeMap<String, String>,
}

impl Submission {
    pub fn post(identity: &str) -> Self {
        Self {
            method: "POST".into(),
            identity: identity.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Trimmed field value; absent fields read as empty.
    fn value(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl FormResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: json!({ "ok": true }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(|e| e.as_str())
    }
}

impl From<FormError> for FormResponse {
    fn from(err: FormError) -> Self {
        Self {
            status: err.status(),
            body: json!({ "ok": false, "error": err.code() }),
        }
    }
}

pub struct FormHandler {
    kind: FormKind,
    data_dir: PathBuf,
}

impl FormHandler {
    pub fn new(kind: FormKind, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            data_dir: data_dir.into(),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn handle(&self, submission: &Submission, now: DateTime<Utc>) -> FormResponse {
        match self.accept(submission, now) {
            Ok(()) => FormResponse::ok(),
            Err(err) => err.into(),
        }
    }

    fn accept(&self, submission: &Submission, now: DateTime<Utc>) -> Result<(), FormError> {
        if !submission.method.eq_ignore_ascii_case("POST") {
            return Err(FormError::MethodNotAllowed);
        }
        if !submission.value(HONEYPOT_FIELD).is_empty() {
            return Err(FormError::InvalidRequest);
        }
        let record = self.validate(submission)?;

        fs::create_dir_all(&self.data_dir).map_err(storage_failure(&self.data_dir))?;
        self.admit(&submission.identity, now.timestamp())?;

        let time = now.to_rfc3339_opts(SecondsFormat::Secs, false);
        let mut line = vec![time.as_str()];
        line.extend(record.iter().copied());
        line.push(submission.identity.as_str());
        self.append(&line)
    }

    /// Check the fields and return the ones stored for this form, in order.
    fn validate<'s>(&self, submission: &'s Submission) -> Result<Vec<&'s str>, FormError> {
        let email = submission.value("email");
        match self.kind {
            FormKind::Newsletter => {
                if !is_valid_email(email) {
                    return Err(FormError::InvalidEmail);
                }
                Ok(vec![email])
            }
            FormKind::Contact => {
                let name = submission.value("name");
                let message = submission.value("message");
                if name.is_empty() || email.is_empty() || message.is_empty() {
                    return Err(FormError::MissingFields);
                }
                if !is_valid_email(email) {
                    return Err(FormError::InvalidEmail);
                }
                if message.chars().count() > MESSAGE_LIMIT {
                    return Err(FormError::MessageTooLong);
                }
                Ok(vec![name, email, message])
            }
        }
    }

    /// Record an accepted submission for `identity`, or refuse when the
    /// window is already full.
    fn admit(&self, identity: &str, now: i64) -> Result<(), FormError> {
        let path = self.data_dir.join(RATE_LIMIT_FILE);
        let fail = storage_failure(&path);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(&fail)?;
        file.lock().map_err(&fail)?;

        let mut raw = String::new();
        file.read_to_string(&mut raw).map_err(&fail)?;
        // Unreadable state starts over rather than blocking every visitor.
        let mut state: BTreeMap<String, Vec<i64>> = if raw.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "resetting unreadable rate-limit state");
                BTreeMap::new()
            })
        };

        let entries = state.entry(identity.to_string()).or_default();
        entries.retain(|ts| *ts >= now - WINDOW_SECS);
        if entries.len() >= self.kind.limit() {
            return Err(FormError::RateLimited);
        }
        entries.push(now);

        let encoded = serde_json::to_string(&state).map_err(|err| {
            warn!(path = %path.display(), error = %err, "cannot encode rate-limit state");
            FormError::StorageUnavailable
        })?;
        file.set_len(0).map_err(&fail)?;
        file.seek(SeekFrom::Start(0)).map_err(&fail)?;
        file.write_all(encoded.as_bytes()).map_err(&fail)?;
        file.flush().map_err(&fail)?;
        file.unlock().map_err(&fail)
    }

    fn append(&self, line: &[&str]) -> Result<(), FormError> {
        let path = self.data_dir.join(self.kind.log_file());
        let fail = storage_failure(&path);
        let file = OpenOptions::new().create(true).append(true).open(&path).map_err(&fail)?;
        file.lock().map_err(&fail)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&file);
        writer.write_record(line).map_err(|err| {
            warn!(path = %path.display(), error = %err, "cannot append submission");
            FormError::StorageUnavailable
        })?;
        writer.flush().map_err(&fail)?;
        drop(writer);
        file.unlock().map_err(&fail)
    }
}

fn storage_failure(path: &Path) -> impl Fn(io::Error) -> FormError + '_ {
    move |err| {
        warn!(path = %path.display(), error = %err, "form storage unavailable");
        FormError::StorageUnavailable
    }
}

/// Write both endpoint scripts and the data directory guard into `output`.
/// Returns the output-relative paths written.
pub fn write_endpoints(output: &Path) -> io::Result<Vec<String>> {
    let mut written = Vec::new();
    for kind in [FormKind::Contact, FormKind::Newsletter] {
        fs::write(output.join(kind.script_name()), kind.script())?;
        written.push(kind.script_name().to_string());
    }
    let data = output.join(DATA_DIR);
    fs::create_dir_all(&data)?;
    let mut guard = File::create(data.join(".htaccess"))?;
    guard.write_all(HTACCESS.as_bytes())?;
    written.push(format!("{DATA_DIR}/.htaccess"));
    Ok(written)
}
