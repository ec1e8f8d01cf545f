use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::ImagePoolProvider;

/// Image pool over fixed, caller-supplied identifiers
#[derive(Debug, Clone, Default)]
pub struct StaticImagePool {
    similar: Vec<String>,
    different: Vec<String>,
}

impl StaticImagePool {
    pub fn new(similar: Vec<String>, different: Vec<String>) -> Self {
        Self { similar, different }
    }
}

#[async_trait]
impl ImagePoolProvider for StaticImagePool {
    async fn similar_images(&self) -> DomainResult<Vec<String>> {
        Ok(self.similar.clone())
    }

    async fn different_images(&self) -> DomainResult<Vec<String>> {
        Ok(self.different.clone())
    }
}
