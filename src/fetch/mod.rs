//! Fetching remote resources through the cache.
//!
//! [`ExternalResourceAccessor`] is the transport seam: it fetches bytes or
//! probes metadata for a location. [`CachingFetcher`] combines an accessor
//! with an [`ExternalResourceCache`](crate::cache::ExternalResourceCache).

pub mod caching;
pub mod http;

use std::fmt;
use std::io::Read;

use crate::cache::ExternalResourceMetaData;
use crate::error::Result;

pub use caching::CachingFetcher;
pub use http::HttpAccessor;

/// A resource body together with the metadata the transport saw.
pub struct RemoteResource {
    /// Metadata reported by the remote.
    pub metadata: ExternalResourceMetaData,
    /// Stream of the resource bytes.
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for RemoteResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResource")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Transport for remote resources.
pub trait ExternalResourceAccessor {
    /// Fetch the resource at `location`. `Ok(None)` means it does not exist.
    fn fetch(&self, location: &str) -> Result<Option<RemoteResource>>;

    /// Read the metadata of the resource at `location` without its body.
    /// `Ok(None)` means it does not exist.
    fn probe(&self, location: &str) -> Result<Option<ExternalResourceMetaData>>;
}

impl<A: ExternalResourceAccessor + ?Sized> ExternalResourceAccessor for &A {
    fn fetch(&self, location: &str) -> Result<Option<RemoteResource>> {
        (**self).fetch(location)
    }

    fn probe(&self, location: &str) -> Result<Option<ExternalResourceMetaData>> {
        (**self).probe(location)
    }
}
