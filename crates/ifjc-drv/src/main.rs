use ifjc_drv::Config;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error (code 99): {}", message);
            eprintln!("usage: ifjc [--emit-tokens | --emit-ast] [--verbose] [FILE]");
            std::process::exit(99);
        }
    };

    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = SimpleLogger::new().with_level(level).init();

    std::process::exit(ifjc_drv::run(&config));
}
