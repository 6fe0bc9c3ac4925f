use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use roam_core::EventBus;
use roam_core::export::render_printable;
use roam_core::trip::TripRepository;
use roam_db::KvStore;

/// Export every trip as printable HTML to `output` or stdout.
pub async fn run_export(store: Arc<dyn KvStore>, output: Option<&Path>) -> anyhow::Result<()> {
    let trips = TripRepository::new(store, EventBus::new()).all().await?;
    let html = render_printable(&trips)?;

    let mut writer: Box<dyn Write> = if let Some(path) = output {
        Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create output file: {}", path.display()))?,
        )
    } else {
        Box::new(std::io::stdout().lock())
    };
    writer.write_all(html.as_bytes())?;
    writer.flush()?;

    if let Some(path) = output {
        tracing::info!(trips = trips.len(), path = %path.display(), "exported itinerary");
        println!("Exported {} trips to {}", trips.len(), path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_core::export::ExportError;
    use roam_db::models::NewTrip;
    use roam_db::store::MemoryStore;

    #[tokio::test]
    async fn writes_html_file() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        TripRepository::new(store.clone(), EventBus::new())
            .create(NewTrip {
                destination: "Paris".to_owned(),
                days: 2,
                ..NewTrip::default()
            })
            .await
            .unwrap();

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("trips.html");
        run_export(store, Some(&path)).await.unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h2>1. Paris</h2>"));
    }

    #[tokio::test]
    async fn no_trips_is_an_error_and_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("trips.html");

        let err = run_export(Arc::new(MemoryStore::new()), Some(&path))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ExportError>(), Some(&ExportError::NoTrips));
        assert!(!path.exists());
    }
}
