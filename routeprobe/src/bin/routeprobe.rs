use clap::Parser;
use routeprobe::app::ProbeApp;

fn main() {
    env_logger::init();
    let args = ProbeApp::parse();
    if let Err(e) = args.op.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
