//! Compile-time build metadata, shown in the startup banner and on `/health`

use serde::Serialize;

/// Build number embedded by `build.rs`, 0 when missing or not numeric
pub const BUILD_NUMBER: u64 = match option_env!("HEALTHGO_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// UTC compile time, `YYYY-MM-DDTHH:MM:SSZ`
pub const BUILD_TIMESTAMP: &str = match option_env!("HEALTHGO_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// `str::parse` is not const
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// Version fields of the `/health` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_number: u64,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_number: BUILD_NUMBER,
        }
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    eprintln!("===============================================");
    eprintln!("  HealthGo Vitals Service");
    eprintln!("  Version: {} | Build: {}", VERSION, BUILD_NUMBER);
    eprintln!("  Compiled: {}", BUILD_TIMESTAMP);
    eprintln!("===============================================");
}
