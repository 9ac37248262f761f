mod app;
mod audio;
mod config;
mod engine;
mod runtime;
mod service;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
