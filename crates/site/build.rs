//! Build script for the site crate.
//!
//! Fingerprints `static/css/main.css` so the stylesheet URL changes with
//! its content. Templates link `main.css?v=<hash>`.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex digits of the SHA-256 kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR is not set");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let hash = fingerprint_css(Path::new(&manifest_dir)).unwrap_or_else(|e| {
        println!("cargo:warning=Could not fingerprint main.css: {e}");
        String::new()
    });
    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// Short SHA-256 of `main.css`.
fn fingerprint_css(manifest_dir: &Path) -> std::io::Result<String> {
    let source = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let digest = format!("{:x}", Sha256::digest(fs::read(&source)?));
    Ok(digest.get(..HASH_LEN).unwrap_or(&digest).to_string())
}
