//! Watch mode: rebuild incrementally whenever the sample tree changes.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, instrument, warn};

use samplebuilder_shared::{Result, SampleBuilderError};

use crate::parser::SampleParser;
use crate::pipeline::{BuildTrigger, ProgressReporter, SamplesBuilder};

/// Quiet period that closes a batch of change events.
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Watch the source root until Ctrl-C, running a [`BuildTrigger::Watch`]
/// build after every settled batch of changes.
pub async fn watch<P: SampleParser>(
    builder: &SamplesBuilder<P>,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    watch_until(builder, progress, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Watch loop that stops once `shutdown` resolves. Failed rebuilds are
/// logged and the loop keeps going.
#[instrument(skip_all, fields(source = %builder.config().paths.source.display()))]
pub async fn watch_until<P, F>(
    builder: &SamplesBuilder<P>,
    progress: &dyn ProgressReporter,
    shutdown: F,
) -> Result<()>
where
    P: SampleParser,
    F: Future<Output = ()>,
{
    let source = &builder.config().paths.source;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event) => {
            let _ = tx.send(event.paths);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "file watcher error"),
    })
    .map_err(watch_error)?;
    watcher
        .watch(source, RecursiveMode::Recursive)
        .map_err(watch_error)?;

    info!("watching samples for changes");
    tokio::pin!(shutdown);

    loop {
        let first = tokio::select! {
            _ = &mut shutdown => break,
            changed = rx.recv() => match changed {
                Some(paths) => paths,
                None => break,
            },
        };

        let changed = collect_batch(&mut rx, first, DEBOUNCE).await;
        info!(changed = changed.len(), "samples changed, rebuilding");
        for path in &changed {
            debug!(path = %path.display(), "changed");
        }

        if let Err(e) = builder.build(BuildTrigger::Watch, progress).await {
            error!(error = %e, "rebuild failed");
        }
    }

    info!("stopped watching samples");
    Ok(())
}

/// Reads carry no change.
fn is_relevant(event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}

/// Gather paths until no event arrives for `window`.
async fn collect_batch(
    rx: &mut UnboundedReceiver<Vec<PathBuf>>,
    first: Vec<PathBuf>,
    window: Duration,
) -> BTreeSet<PathBuf> {
    let mut batch: BTreeSet<PathBuf> = first.into_iter().collect();
    while let Ok(Some(paths)) = tokio::time::timeout(window, rx.recv()).await {
        batch.extend(paths);
    }
    batch
}

fn watch_error(e: notify::Error) -> SampleBuilderError {
    SampleBuilderError::Watch(e.to_string())
}
