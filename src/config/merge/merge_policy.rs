//! Merge rules: defaults first, later sources override key by key.

use crate::cache::DEFAULT_TTL;
use crate::capability::Category;
use crate::config::default_category_ttl_ms;
use crate::orchestrator::DEFAULT_SOURCE_TIMEOUT;
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = Config::builder()
        .set_default("cache.default_ttl_ms", DEFAULT_TTL.as_millis() as u64)?
        .set_default(
            "orchestrator.default_timeout_ms",
            DEFAULT_SOURCE_TIMEOUT.as_millis() as u64,
        )?;

    for category in Category::ALL {
        builder = builder.set_default(
            format!("cache.category_ttl_ms.{}", category.as_str()),
            default_category_ttl_ms(category),
        )?;
    }
    Ok(builder)
}
