//! Batch generation: several independent instances from one config.
//!
//! Instance `i` searches from `seed.for_instance(i)`, so the batch is fully
//! determined by the config. Running on the rayon pool changes only the
//! wall-clock time, never the results or their order.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::report::InstanceReport;
use crate::search::{run_search_with_seed, SearchError};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions<'a> {
    pub parallel: bool,
    pub cancel: Option<&'a AtomicBool>,
}

/// Generate `count` instances and their reports, in instance order.
pub fn run_batch(
    config: &SearchConfig,
    count: usize,
    options: BatchOptions<'_>,
) -> Result<Vec<InstanceReport>, SearchError> {
    config.validate()?;
    info!(label = %config.label, count, parallel = options.parallel, "batch started");

    let run_one = |index: usize| -> Result<InstanceReport, SearchError> {
        let seed = config.seed.for_instance(index);
        let outcome = run_search_with_seed(config, seed, None, options.cancel)?;
        debug!(
            event = "batch_instance",
            index,
            attempts = outcome.attempts,
            found = outcome.found(),
            "batch instance complete"
        );
        let label = format!("{}-{}", config.label, index + 1);
        Ok(InstanceReport::labelled(label, config, &outcome))
    };

    let reports: Result<Vec<InstanceReport>, SearchError> = if options.parallel {
        (0..count).into_par_iter().map(run_one).collect()
    } else {
        (0..count).map(run_one).collect()
    };
    if let Ok(done) = &reports {
        let fallbacks = done.iter().filter(|r| r.warning.is_some()).count();
        info!(label = %config.label, count, fallbacks, "batch finished");
    }
    reports
}
