use chrono::Local;
use juscrap::{config::Config, info_time, process::run, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let config = Config::from_env()?;
    run(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
