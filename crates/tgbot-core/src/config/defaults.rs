//! Default values for config fields.

pub fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_poll_timeout() -> u64 {
    3
}

pub fn default_poll_limit() -> u32 {
    100
}

pub fn default_auth_retry_ms() -> u64 {
    1000
}

pub fn default_fetch_timeout_ms() -> u64 {
    400
}
