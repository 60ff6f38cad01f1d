//! Location syntax and backend construction
//!
//! A location on the command line is either a local path (bare or behind
//! `file://`) or a Swift container behind `swift://`. A region override
//! rides in the scheme: `swift+dfw://backup` selects the `dfw` endpoint
//! from the credential file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use mirrorsync_core::config::Credentials;
use mirrorsync_core::ports::storage_backend::IStorageBackend;
use mirrorsync_store::{LocalBackend, RemoteBackend};
use mirrorsync_swift::SwiftClient;

/// A parsed command-line location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A directory tree on the local filesystem
    Local(PathBuf),
    /// A container in a Swift object store, with an optional region
    Swift {
        container: String,
        region: Option<String>,
    },
}

impl Location {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Swift { .. })
    }
}

/// Parses a location string. Anything without a recognized scheme is a
/// local path.
pub fn parse(input: &str) -> Result<Location> {
    if let Some(path) = input.strip_prefix("file://") {
        if path.is_empty() {
            bail!("empty path in location {input:?}");
        }
        return Ok(Location::Local(PathBuf::from(path)));
    }

    if let Some((scheme, rest)) = input.split_once("://") {
        if scheme == "swift" {
            return swift_location(rest, None, input);
        }
        if let Some(region) = scheme.strip_prefix("swift+") {
            if region.is_empty() {
                bail!("empty region in location {input:?}");
            }
            return swift_location(rest, Some(region.to_string()), input);
        }
        bail!("unsupported scheme {scheme:?} in location {input:?}");
    }

    Ok(Location::Local(PathBuf::from(input)))
}

fn swift_location(container: &str, region: Option<String>, input: &str) -> Result<Location> {
    if container.is_empty() || container.contains('/') {
        bail!("invalid container name in location {input:?}");
    }
    Ok(Location::Swift {
        container: container.to_string(),
        region,
    })
}

/// Builds the storage backend for a parsed location. Remote locations
/// need credentials and get their container created up front.
pub async fn backend(
    location: &Location,
    credentials: Option<&Credentials>,
) -> Result<Arc<dyn IStorageBackend>> {
    match location {
        Location::Local(path) => Ok(Arc::new(LocalBackend::new(path.clone()))),
        Location::Swift { container, region } => {
            let credentials =
                credentials.context("remote location given but no credentials loaded")?;
            let endpoint = credentials.endpoint_for(region.as_deref());

            let mut client =
                SwiftClient::new(endpoint, container.clone(), credentials.auth_token.clone());
            if let Some(ref storage_class) = credentials.storage_class {
                client = client.with_storage_class(storage_class.clone());
            }
            client
                .ensure_container()
                .await
                .with_context(|| format!("failed to ensure container {container:?}"))?;

            Ok(Arc::new(RemoteBackend::new(Arc::new(client))))
        }
    }
}
