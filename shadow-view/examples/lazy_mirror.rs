//! Lazy mirror demonstration
//!
//! Mirrors an in-memory matrix, reads a few rows on demand, then lets the
//! background worker finish the copy.
//!
//! Run with:
//! ```bash
//! cargo run -p shadow-view --example lazy_mirror
//!
//! # With a background share and a persistent cache file
//! cargo run -p shadow-view --example lazy_mirror -- 0.25 /tmp/matrix.cache
//! ```

use shadow_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use shadow_runtime::{ChunkSize, MirrorConfig};
use shadow_store::VecSource;
use shadow_view::{CacheView, Index, MirrorRegistry};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

const ROWS: usize = 4096;
const COLS: usize = 64;

fn main() {
    let args: Vec<String> = env::args().collect();
    let share: f64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0.5);

    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .expect("Failed to initialize logging");

    let values: Vec<f32> = (0..ROWS * COLS).map(|v| v as f32).collect();
    let source = Arc::new(VecSource::from_elements(&values, COLS).expect("valid layout"));

    let mut config = MirrorConfig::default()
        .with_chunk_size(ChunkSize::Items(128))
        .with_worker_name("demo-sync");
    if let Some(path) = args.get(2) {
        config = config.with_cache_location(path);
    }

    let registry = MirrorRegistry::new();
    let view: Arc<CacheView<f32>> = registry.open(source, config).expect("Failed to open view");
    info!(shape = ?view.shape(), path = %view.path().display(), "Mirror opened");

    let row = view.item(-1).expect("read last row");
    info!(first = row.values[0], ratio = view.copy_ratio(), "Read last row on demand");

    let column = view
        .get((Index::List(vec![0, 10, 20]), Index::Scalar(3)))
        .expect("read column");
    info!(values = ?column.values, ratio = view.copy_ratio(), "Read scattered cells");

    view.set_bandwidth_share(share);
    while !view.fully_copied() && share > 0.0 {
        thread::sleep(Duration::from_millis(50));
        info!(
            ratio = %format!("{:.1}%", view.copy_ratio() * 100.0),
            per_item = ?view.sync_item_duration(),
            "Background copy progressing"
        );
    }

    let closed = registry.close_all().expect("close mirrors");
    info!(closed, "Demo complete");
}
