//! Embeds a build number and build time into the HealthGo binaries.
//!
//! CI can pin the number with `HEALTHGO_BUILD_NUMBER`; local builds bump a
//! counter kept in `build_number.txt`.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn next_local_build(counter: &Path) -> u64 {
    let previous: u64 = fs::read_to_string(counter)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    let next = previous + 1;
    if let Err(e) = fs::write(counter, next.to_string()) {
        println!("cargo:warning=could not persist build number: {}", e);
    }
    next
}

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=HEALTHGO_BUILD_NUMBER");

    let build = match std::env::var("HEALTHGO_BUILD_NUMBER") {
        Ok(pinned) if !pinned.trim().is_empty() => pinned.trim().to_string(),
        _ => next_local_build(Path::new(COUNTER_FILE)).to_string(),
    };
    let compiled_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");

    println!("cargo:rustc-env=HEALTHGO_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=HEALTHGO_BUILD_TIMESTAMP={}", compiled_at);
}
