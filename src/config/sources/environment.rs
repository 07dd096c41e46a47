//! Environment source: TREELENS_MAX_CACHE, TREELENS_DEBUG, TREELENS_LOGGING__LEVEL, ...

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add `TREELENS_*` variables to builder. Nested keys use `__`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("TREELENS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
