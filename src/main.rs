//! # Voxel Streaming Entry Point
//!
//! Runs the headless streaming demo.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

fn main() {
    if let Err(err) = voxel_streaming::run() {
        log::error!("{}", err);
        eprintln!("voxel-streaming: {}", err);
        std::process::exit(1);
    }
}
