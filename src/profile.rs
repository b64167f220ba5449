//! Author profile resolution.
//!
//! Looks up each distinct DID against `<api>/xrpc/app.bsky.actor.getProfile`
//! with at most `concurrency` requests in flight. Resolution never fails: a
//! lookup that errors for any reason yields [`Profile::fallback`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::Profile;

const GET_PROFILE_PATH: &str = "xrpc/app.bsky.actor.getProfile";

/// Resolves public profiles for sets of DIDs.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    http: reqwest::Client,
    api_url: String,
    concurrency: usize,
}

impl ProfileResolver {
    /// Create a resolver for the profile API at `api_url` (scheme and host,
    /// without the XRPC path), allowing 5 lookups in flight.
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            concurrency: 5,
        }
    }

    /// Set the maximum number of lookups in flight. Values below 1 are
    /// raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve one profile per distinct DID in `dids`.
    ///
    /// If `cancel` fires, outstanding lookups are aborted and the map built
    /// so far is returned; callers are expected to check the token and
    /// discard it.
    pub async fn resolve(
        &self,
        dids: &[String],
        cancel: &CancellationToken,
    ) -> HashMap<String, Profile> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = dids
            .iter()
            .map(String::as_str)
            .filter(|did| seen.insert(*did))
            .collect();
        let mut profiles = HashMap::with_capacity(unique.len());
        if unique.is_empty() {
            return profiles;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for did in &unique {
            let did = did.to_string();
            let http = self.http.clone();
            let url = self.profile_url();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let profile = match semaphore.acquire_owned().await {
                    Ok(_permit) => fetch_profile(&http, &url, &did).await,
                    Err(_) => Profile::fallback(&did),
                };
                (did, profile)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((did, profile))) => {
                        profiles.insert(did, profile);
                    }
                    Some(Err(e)) => debug!(error = %e, "profile lookup task failed"),
                    None => break,
                },
            }
        }

        if !cancel.is_cancelled() {
            for did in unique {
                profiles
                    .entry(did.to_string())
                    .or_insert_with(|| Profile::fallback(did));
            }
        }

        profiles
    }

    fn profile_url(&self) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), GET_PROFILE_PATH)
    }
}

/// Fetch a single profile, substituting the fallback on any failure.
async fn fetch_profile(http: &reqwest::Client, url: &str, did: &str) -> Profile {
    match try_fetch_profile(http, url, did).await {
        Ok(profile) => profile,
        Err(e) => {
            debug!(did, error = %e, "profile lookup failed, using DID as handle");
            Profile::fallback(did)
        }
    }
}

async fn try_fetch_profile(http: &reqwest::Client, url: &str, did: &str) -> anyhow::Result<Profile> {
    let resp = http.get(url).query(&[("actor", did)]).send().await?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        anyhow::bail!("profile API returned {}", status);
    }

    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
