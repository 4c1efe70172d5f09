use clap::Parser;

use defect_detector::app;
use defect_detector::cli::Args;
use defect_detector::config::AppConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Single top-level handler: every fatal error is logged here and
    // mapped to a non-zero exit
    if let Err(err) = AppConfig::resolve(args).and_then(app::run) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
