use std::path::Path;

use avgen_client::VideoClient;
use avgen_orchestrator::OrchestratorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = OrchestratorConfig::from_env()?;

    println!(
        "avgen-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    avgen_media::check_ffmpeg()?;
    avgen_media::check_ffprobe()?;
    ensure_video_health(&config).await?;

    println!("avgen-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

async fn ensure_video_health(config: &OrchestratorConfig) -> anyhow::Result<()> {
    if config.video.health_url.is_none() {
        println!("avgen-selfcheck: no video health url configured, skipping");
        return Ok(());
    }

    let client = VideoClient::new(config.video.clone())?;
    if !client.health_check().await? {
        return Err(anyhow::anyhow!("video service is not healthy"));
    }
    Ok(())
}
