//! Implementation of the `image-compare plan` command.
//!
//! Draws one session sequence from the configured image folders without
//! starting a server, for checking folder contents and selection settings.

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ImagePair};
use crate::domain::ports::ImagePoolProvider;
use crate::infrastructure::images::DirectoryImagePool;
use crate::services::{PairPools, PairSelector, SelfPairPolicy};

#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Pairs per session (overrides session.target)
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Leave out self-pairs
    #[arg(long)]
    pub no_self_pairs: bool,

    /// Seed for a reproducible sequence
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub similar_pairs: usize,
    pub different_pairs: usize,
    pub self_pairs: usize,
    pub pairs: Vec<ImagePair>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        format!(
            "Pools: {} similar pair(s), {} different pair(s)\n{}\n\n{} pair(s) planned, {} self-pair(s)",
            self.similar_pairs,
            self.different_pairs,
            TableFormatter::new().format_plan(&self.pairs),
            self.pairs.len(),
            self.self_pairs
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Select a sequence from `provider` and summarize it.
pub async fn plan(
    provider: &dyn ImagePoolProvider,
    selector: PairSelector,
    seed: Option<u64>,
) -> Result<PlanOutput> {
    let pools = PairPools::from_provider(provider)
        .await
        .context("Failed to build image pools")?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let pairs = selector
        .select(&pools, &mut rng)
        .context("Failed to select session pairs")?;

    Ok(PlanOutput {
        similar_pairs: pools.similar_pairs.len(),
        different_pairs: pools.different_pairs.len(),
        self_pairs: pairs.iter().filter(|p| p.is_self_pair()).count(),
        pairs,
    })
}

pub async fn execute(args: PlanArgs, config: Config, json_mode: bool) -> Result<()> {
    let mut selector = PairSelector::from(&config.session);
    if let Some(target) = args.target {
        anyhow::ensure!(target > 0, "target must be at least 1");
        selector = PairSelector::new(target).with_self_pairs(selector.self_pair_policy());
    }
    if args.no_self_pairs {
        selector = selector.with_self_pairs(SelfPairPolicy::Disabled);
    }

    let pool = DirectoryImagePool::from_config(&config.images);
    let result = plan(&pool, selector, args.seed).await?;
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::images::StaticImagePool;

    fn pool() -> StaticImagePool {
        StaticImagePool::new(
            (0..4).map(|i| format!("s{i}.png")).collect(),
            (0..5).map(|i| format!("d{i}.png")).collect(),
        )
    }

    #[tokio::test]
    async fn test_plan_counts_pools_and_self_pairs() {
        let selector = PairSelector::new(10).with_self_pairs(SelfPairPolicy::Ratio(0.2));
        let result = plan(&pool(), selector, Some(3)).await.unwrap();

        assert_eq!(result.similar_pairs, 2);
        assert_eq!(result.different_pairs, 10);
        assert_eq!(result.pairs.len(), 10);
        assert_eq!(result.self_pairs, 2);
    }

    #[tokio::test]
    async fn test_plan_is_reproducible_with_seed() {
        let selector = PairSelector::new(6);
        let first = plan(&pool(), selector, Some(42)).await.unwrap();
        let second = plan(&pool(), selector, Some(42)).await.unwrap();
        assert_eq!(first.pairs, second.pairs);
    }

    #[tokio::test]
    async fn test_plan_without_images_fails() {
        let empty = StaticImagePool::default();
        assert!(plan(&empty, PairSelector::new(5), None).await.is_err());
    }
}
