//! isqforge CLI binary
//!
//! This is the minimal entrypoint for the isqforge wizard.
//! All logic is in the library; main.rs only invokes cli::run().

fn main() {
    if let Err(err) = isqforge::cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
