use clap::Parser;
use invocation_shim::{exec_tokio, init_logging, Config, ProcessHandler};

fn main() {
    let config = Config::parse();
    if let Err(e) = init_logging(config.log_level) {
        eprintln!("{:?}", e);
    }
    log::debug!("Using handler at {}", config.handler_path.display());

    let handler = ProcessHandler::new(&config.handler_path);
    if let Err(err) = exec_tokio(handler, config.options()) {
        eprint!("{}", err.report());
        std::process::exit(err.exit_code());
    }
}
