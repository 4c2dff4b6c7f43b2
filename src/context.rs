/// Environment variable holding the name of the invoked function
pub const FUNCTION_NAME_VAR: &str = "FUNCTION_NAME";
/// Environment variable holding the id of the current request
pub const REQUEST_ID_VAR: &str = "REQUEST_ID";

const UNKNOWN: &str = "unknown";

/// Metadata passed to the handler alongside the event.
///
/// Serialized in camelCase, with `startTime` as milliseconds since the
/// unix epoch:
///
/// ```json
/// {"functionName": "resize", "requestId": "exec-1700000000", "startTime": 1700000000123}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Name of the function, `"unknown"` if not provided
    pub function_name: String,
    /// Id of the request, `"unknown"` if not provided
    pub request_id: String,
    /// Time at which the context was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl Context {
    /// Creates a context from `FUNCTION_NAME` and `REQUEST_ID`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a context by resolving variables through `lookup`.
    /// Missing and empty values fall back to `"unknown"`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_owned())
        };
        Self {
            function_name: resolve(FUNCTION_NAME_VAR),
            request_id: resolve(REQUEST_ID_VAR),
            start_time: chrono::Utc::now(),
        }
    }
}
