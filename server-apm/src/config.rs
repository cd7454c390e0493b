//! Options accepted by [`ApmMiddleware`](crate::ApmMiddleware).
//!
//! Options are plain values built with the `config_*` functions and handed to the middleware
//! when it is constructed. They are folded into a [`ConfigMap`] once; later options override
//! earlier ones with the same key and anything left unset falls back to its default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Extensions;
use server_middleware::Request;

/// Computes the name a request's transaction is reported under.
pub type TransactionNameFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// The keys a [`ConfigOption`] can set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Whether errors returned by the handler chain are reported. Expects [`ConfigValue::Bool`].
    NoticeErrorEnabled,
    /// Status codes whose errors are never reported. Expects [`ConfigValue::StatusCodes`].
    StatusCodeIgnored,
    /// Replaces the default `"{METHOD} {PATH}"` naming. Expects [`ConfigValue::NameFunc`].
    CustomTransactionNameFunc,
}

/// A value stored under a [`ConfigKey`].
#[derive(Clone)]
pub enum ConfigValue {
    Bool(bool),
    StatusCodes(Vec<u16>),
    NameFunc(TransactionNameFn),
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            ConfigValue::StatusCodes(v) => f.debug_tuple("StatusCodes").field(v).finish(),
            ConfigValue::NameFunc(_) => f.write_str("NameFunc(..)"),
        }
    }
}

/// A single configuration entry.
#[derive(Clone, Debug)]
pub struct ConfigOption {
    key: ConfigKey,
    value: ConfigValue,
}

impl ConfigOption {
    /// Pairs a key with an arbitrary value.
    ///
    /// Prefer the `config_*` constructors. A value of the wrong shape for its key is accepted
    /// here and ignored when read back, leaving the key at its default.
    pub fn new(key: ConfigKey, value: ConfigValue) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> ConfigKey {
        self.key
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }
}

/// Controls whether errors returned by the handler chain are reported to the agent.
///
/// Default: `false`
pub fn config_notice_error_enabled(enabled: bool) -> ConfigOption {
    ConfigOption::new(ConfigKey::NoticeErrorEnabled, ConfigValue::Bool(enabled))
}

/// Status codes whose errors are not reported, even with error reporting enabled.
///
/// Default: none
pub fn config_status_code_ignored<I>(status_codes: I) -> ConfigOption
where
    I: IntoIterator<Item = u16>,
{
    ConfigOption::new(
        ConfigKey::StatusCodeIgnored,
        ConfigValue::StatusCodes(status_codes.into_iter().collect()),
    )
}

/// Names transactions with `name_func` instead of [`default_transaction_name`].
pub fn config_custom_transaction_name_func<F>(name_func: F) -> ConfigOption
where
    F: Fn(&Request) -> String + Send + Sync + 'static,
{
    ConfigOption::new(
        ConfigKey::CustomTransactionNameFunc,
        ConfigValue::NameFunc(Arc::new(name_func)),
    )
}

/// Options folded by key. Built once, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ConfigMap(HashMap<ConfigKey, ConfigValue>);

impl ConfigMap {
    /// Folds `options` in order; the last option for a key wins.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        options.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: ConfigKey) -> Option<&ConfigValue> {
        self.0.get(&key)
    }

    /// Defaults to `false` when unset or not a [`ConfigValue::Bool`].
    pub fn notice_error_enabled(&self) -> bool {
        match self.get(ConfigKey::NoticeErrorEnabled) {
            Some(ConfigValue::Bool(enabled)) => *enabled,
            _ => false,
        }
    }

    /// Defaults to an empty list when unset or not a [`ConfigValue::StatusCodes`].
    pub fn status_code_ignored(&self) -> Vec<u16> {
        match self.get(ConfigKey::StatusCodeIgnored) {
            Some(ConfigValue::StatusCodes(codes)) => codes.clone(),
            _ => Vec::new(),
        }
    }

    /// Returns `default` when unset or not a [`ConfigValue::NameFunc`].
    pub fn custom_transaction_name_func(&self, default: TransactionNameFn) -> TransactionNameFn {
        match self.get(ConfigKey::CustomTransactionNameFunc) {
            Some(ConfigValue::NameFunc(name_func)) => Arc::clone(name_func),
            _ => default,
        }
    }
}

impl FromIterator<ConfigOption> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = ConfigOption>>(iter: I) -> Self {
        let mut map = HashMap::new();
        for option in iter {
            map.insert(option.key, option.value);
        }
        ConfigMap(map)
    }
}

/// `"{METHOD} {PATH}"`, using the raw request path.
pub fn default_transaction_name(req: &Request) -> String {
    format!("{} {}", req.method(), req.uri().path())
}

/// Overrides the transaction name of a single request.
///
/// Insert it into the request's extensions ahead of [`ApmMiddleware`], for instance with a
/// request initialiser; it takes priority over the configured naming function.
///
/// ```
/// use server_apm::{ApmMiddleware, TransactionName};
/// use server_middleware::{handler_fn, AppBuilder, Extension, Request, Response, Result};
///
/// async fn health(_req: Request) -> Result<Response> {
///     Ok(Response::new("ok".into()))
/// }
///
/// let app = AppBuilder::new(handler_fn(health))
///     .with_init(Extension(TransactionName("health-check".into())))
///     .with(ApmMiddleware::disabled())
///     .build();
/// ```
///
/// [`ApmMiddleware`]: crate::ApmMiddleware
#[derive(Clone, Debug)]
pub struct TransactionName(pub std::borrow::Cow<'static, str>);

/// Configuration resolved from a [`ConfigMap`], captured by the middleware for its lifetime.
#[derive(Clone)]
pub(crate) struct InstrumentationConfig {
    pub(crate) notice_error_enabled: bool,
    pub(crate) status_code_ignored: Vec<u16>,
    pub(crate) transaction_name: TransactionNameFn,
}

impl InstrumentationConfig {
    pub(crate) fn from_map(map: &ConfigMap) -> Self {
        Self {
            notice_error_enabled: map.notice_error_enabled(),
            status_code_ignored: map.status_code_ignored(),
            transaction_name: map
                .custom_transaction_name_func(Arc::new(default_transaction_name)),
        }
    }

    pub(crate) fn transaction_name(&self, req: &Request, extensions: &Extensions) -> String {
        match extensions.get::<TransactionName>() {
            Some(TransactionName(name)) => name.to_string(),
            None => (self.transaction_name)(req),
        }
    }

    pub(crate) fn is_ignored(&self, status: u16) -> bool {
        self.status_code_ignored.contains(&status)
    }
}

impl fmt::Debug for InstrumentationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentationConfig")
            .field("notice_error_enabled", &self.notice_error_enabled)
            .field("status_code_ignored", &self.status_code_ignored)
            .finish_non_exhaustive()
    }
}
