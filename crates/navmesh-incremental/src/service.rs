//! Async front end for the incremental builder
//!
//! Builds run on tokio's blocking pool. Starting a rebuild cancels the one in
//! flight, and every successful build is published to watchers.

use std::sync::{Arc, Mutex};

use navmesh_common::{BoundingBox, Error, Result};
use tokio::sync::watch;

use crate::builder::{lock, BuildResult, IncrementalNavMeshBuilder};
use crate::cancel::CancellationToken;
use crate::config::{BuildSettings, NavMeshGroup};
use crate::navmesh::NavMesh;

pub struct NavMeshBuildService {
    builder: Arc<IncrementalNavMeshBuilder>,
    in_flight: Mutex<Option<CancellationToken>>,
    published: watch::Sender<Option<Arc<NavMesh>>>,
}

impl NavMeshBuildService {
    pub fn new(builder: Arc<IncrementalNavMeshBuilder>) -> Self {
        let (published, _) = watch::channel(builder.current());
        Self {
            builder,
            in_flight: Mutex::new(None),
            published,
        }
    }

    pub fn builder(&self) -> &Arc<IncrementalNavMeshBuilder> {
        &self.builder
    }

    /// Receiver notified whenever a build succeeds
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<NavMesh>>> {
        self.published.subscribe()
    }

    /// Last navmesh published by this service
    pub fn current(&self) -> Option<Arc<NavMesh>> {
        self.published.borrow().clone()
    }

    /// Cancels the build in flight, if any
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.in_flight).take() {
            token.cancel();
        }
    }

    /// Rebuilds on the blocking pool, superseding any build in flight
    ///
    /// The superseded build resolves with `cancelled == true`.
    pub async fn rebuild(
        &self,
        settings: BuildSettings,
        groups: Vec<NavMeshGroup>,
        regions: Vec<BoundingBox>,
    ) -> Result<BuildResult> {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.in_flight).replace(token.clone()) {
            log::debug!("Cancelling superseded navmesh build");
            previous.cancel();
        }

        let builder = Arc::clone(&self.builder);
        let build_token = token.clone();
        let joined = tokio::task::spawn_blocking(move || {
            builder.build(&settings, &groups, &regions, &build_token)
        })
        .await;

        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.as_ref().is_some_and(|t| t.same_token(&token)) {
                *in_flight = None;
            }
        }

        let result = joined.map_err(|e| Error::BuildTask(e.to_string()))??;
        if result.success {
            if let Some(navmesh) = &result.navmesh {
                self.published.send_replace(Some(Arc::clone(navmesh)));
            }
        }
        Ok(result)
    }
}
