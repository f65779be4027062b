use anyhow::{Context, Result};
use redbal::{init_tracing_once, CollectOptions, CollectionController, JsonlRecordWriter, SnapshotSource};
use std::path::PathBuf;
use time::OffsetDateTime;

const CONFIG_PATH: &str = "./redbal.json";
const SNAPSHOT_DIR: &str = "./snapshot";
const OUT_PATH: &str = "./out/comments_balanced.jsonl";

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var_os(key).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
}

fn main() -> Result<()> {
    init_tracing_once();

    let config_path = env_path("REDBAL_CONFIG", CONFIG_PATH);
    let snapshot_dir = env_path("REDBAL_SNAPSHOT_DIR", SNAPSHOT_DIR);
    let out_path = env_path("REDBAL_OUT", OUT_PATH);

    let opts = CollectOptions::from_json_file(&config_path)
        .with_context(|| format!("loading options from {}", config_path.display()))?;
    opts.validate()?;

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let source = SnapshotSource::open(&snapshot_dir, now)?;

    let outcome = CollectionController::new(opts, source).collect_at(now)?;
    if outcome.dataset.is_empty() {
        tracing::warn!("no records collected; check the snapshot contents or widen the window");
        return Ok(());
    }

    let mut writer = JsonlRecordWriter::create(&out_path)?;
    outcome.dataset.write_to(&mut writer)?;
    let n = writer.finish()?;
    println!("Wrote {} records to {}", n, out_path.display());

    Ok(())
}
