use screenerbot::arguments;
use screenerbot::logger::{self, LogTag};
use screenerbot::run;

#[tokio::main]
async fn main() {
    arguments::set_cmd_args(std::env::args().collect());
    logger::init();

    if let Err(e) = run::run_bot().await {
        logger::error(LogTag::System, &format!("fatal: {}", e));
        std::process::exit(1);
    }
}
