//! Progress reporting for package fetches.

use std::path::Path;

use log::{debug, info};

use crate::package::locator::Locator;

/// Receives fetch events.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn cache_hit(&self, locator: &Locator);
    fn cache_miss(&self, locator: &Locator, message: &str);
    fn unused_cache_entry(&self, path: &Path);
}

/// Forwards fetch events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn cache_hit(&self, locator: &Locator) {
        debug!("Cache hit: {}", locator);
    }

    fn cache_miss(&self, locator: &Locator, message: &str) {
        info!("Cache miss: {} ({})", locator, message);
    }

    fn unused_cache_entry(&self, path: &Path) {
        let name = path.file_name().unwrap_or(path.as_os_str());
        info!("{} appears to be unused - removing", name.to_string_lossy());
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::locator::PackageIdent;
    use log::Level;

    #[test]
    fn test_log_reporter_writes_records() {
        testing_logger::setup();
        let locator = Locator::new(
            PackageIdent::parse("@shared/ui").unwrap(),
            "polyrepo+git@host:g/ui.git#main",
        );

        LogReporter.cache_miss(&locator, "fetching from remote");
        LogReporter.unused_cache_entry(Path::new("/cache/@shared-ui-0123.tgz"));

        testing_logger::validate(|logs| {
            assert_eq!(logs.len(), 2);
            assert_eq!(logs[0].level, Level::Info);
            assert!(logs[0].body.contains("@shared/ui@polyrepo+git@host:g/ui.git#main"));
            assert_eq!(
                logs[1].body,
                "@shared-ui-0123.tgz appears to be unused - removing"
            );
        });
    }
}
