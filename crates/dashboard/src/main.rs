use clap::Parser;

#[tokio::main]
async fn main() {
    let args = dashboard::arguments::Arguments::parse();
    observe::tracing::initialize(&args.observe_config());
    tracing::info!("running dashboard with validated arguments:\n{}", args);
    if let Err(err) = dashboard::run(args).await {
        tracing::error!(?err, "dashboard failed");
        std::process::exit(1);
    }
}
