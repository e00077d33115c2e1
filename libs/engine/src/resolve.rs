//! Filename → artifact resolution across releases.

use imgvault_catalog::CatalogClient;
use imgvault_types::{Architecture, Artifact};

use crate::progress::{Event, Progress};
use crate::{Discovery, EngineError};

/// Finds the artifact published under `filename`, searching architectures
/// in caller priority order and releases newest-first within each.
///
/// The search stops at the first release with at least one match: the
/// newest matching release is taken as the relevant one, and older
/// releases are never listed. Within the stopping release, duplicate
/// listings are broken by latest `date_published`; remaining ties keep
/// first-seen order (deterministic but otherwise arbitrary).
pub(crate) async fn resolve_filename(
    client: &CatalogClient,
    discovery: &Discovery,
    progress: &dyn Progress,
    filename: &str,
    archs: &[Architecture],
) -> Result<Artifact, EngineError> {
    for &arch in archs {
        let releases = discovery.discover(arch).await?;

        for release in releases.iter() {
            let artifacts = client.list_release_images(release).await?;
            let matches: Vec<&Artifact> = artifacts
                .iter()
                .filter(|artifact| artifact.filename == filename)
                .collect();

            progress.on_event(Event::ReleaseProbed {
                release: *release,
                matched: !matches.is_empty(),
            });

            if let Some(best) = pick_latest(&matches) {
                tracing::debug!(%release, filename, "resolved filename");
                return Ok(best.clone());
            }
        }
    }

    Err(EngineError::NotFound {
        filename: filename.to_string(),
    })
}

/// Picks the latest-published artifact; first-seen wins ties.
fn pick_latest<'a>(matches: &[&'a Artifact]) -> Option<&'a Artifact> {
    let mut best: Option<&Artifact> = None;
    for candidate in matches {
        match best {
            Some(current) if candidate.date_published <= current.date_published => {}
            _ => best = Some(candidate),
        }
    }
    best
}
