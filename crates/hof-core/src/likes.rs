//! # Likes
//!
//! Folds like objects into per-target actor sets and counts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::discovery::Discovery;
use crate::error::Result;
use crate::models::{GraffitiObject, Like};
use crate::schemas::{like_schema, LikeSchemaOptions};
use crate::traits::Graffiti;

/// Target URI -> distinct actors who liked it.
pub type LikeActors = HashMap<String, BTreeSet<String>>;

/// Single pass: an actor liking the same target twice counts once.
pub fn like_actors_per_target(likes: &[GraffitiObject<Like>]) -> LikeActors {
    let mut actors_per_target = LikeActors::new();
    for like in likes {
        actors_per_target
            .entry(like.value.target.clone())
            .or_default()
            .insert(like.actor.clone());
    }
    actors_per_target
}

pub fn like_count_per_target(actors_per_target: &LikeActors) -> HashMap<String, usize> {
    actors_per_target
        .iter()
        .map(|(target, actors)| (target.clone(), actors.len()))
        .collect()
}

pub fn like_count(counts: &HashMap<String, usize>, target: &str) -> usize {
    counts.get(target).copied().unwrap_or(0)
}

/// Live like counts for a set of targets.
pub struct LikeTally {
    discovery: Discovery,
    targets: RwLock<Vec<String>>,
}

impl LikeTally {
    pub fn new(graffiti: Arc<dyn Graffiti>, targets: Vec<String>, channels: Vec<String>) -> Self {
        let schema = like_schema(&LikeSchemaOptions {
            targets: Some(targets.clone()),
            actors: None,
        });
        Self {
            discovery: Discovery::new(graffiti, channels, schema),
            targets: RwLock::new(targets),
        }
    }

    /// Narrows the query to new targets; call `refresh` afterwards.
    pub async fn set_targets(&self, targets: Vec<String>) {
        let schema = like_schema(&LikeSchemaOptions {
            targets: Some(targets.clone()),
            actors: None,
        });
        *self.targets.write().await = targets;
        self.discovery.set_schema(schema).await;
    }

    pub async fn targets(&self) -> Vec<String> {
        self.targets.read().await.clone()
    }

    pub async fn refresh(&self) -> Result<()> {
        self.discovery.refresh().await
    }

    /// Waits for a like in our channels to be written, then refreshes.
    pub async fn changed(&self) -> Result<()> {
        self.discovery.changed().await
    }

    pub fn likes(&self) -> Vec<GraffitiObject<Like>> {
        self.discovery
            .results()
            .into_iter()
            .filter_map(|object| object.decode::<Like>().ok())
            .collect()
    }

    pub fn actors_per_target(&self) -> LikeActors {
        like_actors_per_target(&self.likes())
    }

    pub fn count_per_target(&self) -> HashMap<String, usize> {
        like_count_per_target(&self.actors_per_target())
    }

    pub fn count(&self, target: &str) -> usize {
        like_count(&self.count_per_target(), target)
    }
}
