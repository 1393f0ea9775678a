use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use welfare_shares::chart::{self, ChartConfig};
use welfare_shares::pipeline;
use welfare_shares::schema::files;

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let wide = pipeline::run(
        Path::new(files::RECIPIENTS_CSV),
        Path::new(files::SHARES_CSV),
    )?;
    info!(
        rows = wide.height(),
        columns = wide.width(),
        "wrote {}",
        files::SHARES_CSV
    );

    // Charts only trust the persisted file, never the in-memory table.
    let shares = pipeline::read_shares(Path::new(files::SHARES_CSV))?;
    let written = chart::render_scheme_charts(&shares, &ChartConfig::default())?;
    info!("rendered {} scheme charts", written.len());

    Ok(())
}
