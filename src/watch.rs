use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

pub struct Watch {
    pub watcher: RecommendedWatcher,
    pub channel: broadcast::Sender<Event>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Reload,
}

impl Watch {
    /// Watch each existing directory in `paths` recursively. Paths that don't
    /// exist are skipped with a warning.
    pub fn new(paths: &[PathBuf]) -> notify::Result<Self> {
        let (tx, _) = broadcast::channel(16);
        let channel = tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if let EventKind::Modify(ModifyKind::Data(_)) | EventKind::Create(_) =
                        event.kind
                    {
                        debug!("change detected: {:?}", event.paths);
                        // No subscribers is fine; the message is just dropped.
                        let _ = tx.send(Event::Reload);
                    }
                }
                Err(e) => warn!("watch error: {e}"),
            },
            Config::default(),
        )?;

        for path in paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
            } else {
                warn!("not watching missing path {}", path.display());
            }
        }

        Ok(Self { watcher, channel })
    }

    /// A stream that yields an event for every change seen after this call.
    /// Lagged receivers skip the events they missed.
    pub fn stream(&self) -> impl Stream<Item = Event> + use<> {
        BroadcastStream::new(self.channel.subscribe()).filter_map(Result::ok)
    }
}
