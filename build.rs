use std::env;
use std::path::Path;

// Bake STOCK_* settings from a local .env file into the binary so that
// `option_env!` in config.rs can use them as fallbacks.
fn main() {
    let env_file = Path::new(".env");

    if env_file.exists() {
        println!("cargo:rerun-if-changed=.env");

        match dotenvy::from_path_iter(env_file) {
            Ok(entries) => {
                for entry in entries {
                    let (key, value) = match entry {
                        Ok(pair) => pair,
                        Err(err) => {
                            println!("cargo:warning=skipping malformed .env line: {}", err);
                            continue;
                        }
                    };

                    // Only our own keys, and never override the real environment
                    if key.starts_with("STOCK_") && env::var(&key).is_err() {
                        println!("cargo:rustc-env={}={}", key, value);
                    }
                }
            }
            Err(err) => println!("cargo:warning=could not read .env: {}", err),
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
    for key in [
        "STOCK_API_URL",
        "STOCK_APP_TITLE",
        "STOCK_WANTED_REFRESH_MS",
        "STOCK_ALL_REFRESH_MS",
        "STOCK_IMAGES_REFRESH_MS",
        "STOCK_FETCH_RETRIES",
    ] {
        println!("cargo:rerun-if-env-changed={}", key);
    }
}
