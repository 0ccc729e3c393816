//! Kodegen Compile - native executables and portable archives for PHP applications.
//!
//! This binary packs a PHP application into a PHAR archive and assembles it
//! with prebuilt runtime stubs into standalone executables.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = kodegen_bundler_compile::cli::run().await.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        1
    });

    process::exit(exit_code);
}
