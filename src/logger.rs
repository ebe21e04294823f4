use log4rs::filter::{Filter, Response};
use log::{LevelFilter, Record};
use log4rs::Handle;
use chrono::Local;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::encode::pattern::PatternEncoder;
use log4rs::config::{Appender, Root};

use crate::config::Settings;

/// Accepts records whose level lies between the two bounds, in either order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LevelRangeFilter {
    level_range_start: LevelFilter,
    level_range_end: LevelFilter,
}

impl LevelRangeFilter {
    pub fn new(level_range_start: LevelFilter, level_range_end: LevelFilter) -> LevelRangeFilter {
        LevelRangeFilter { level_range_start, level_range_end }
    }

    pub fn accepts(&self, level: log::Level) -> bool {
        (level >= self.level_range_start && level <= self.level_range_end) ||
        (level >= self.level_range_end && level <= self.level_range_start)
    }
}

impl Filter for LevelRangeFilter {
    fn filter(&self, record: &Record) -> Response {
        if self.accepts(record.level()) {
            Response::Accept
        } else {
            Response::Reject
        }
    }
}

// (appender name, file stem, lower bound, upper bound)
const LOG_FILES: [(&str, &str, LevelFilter, LevelFilter); 3] = [
    ("debug_rolling_file", "debug", LevelFilter::Trace, LevelFilter::Debug),
    ("info_rolling_file", "info", LevelFilter::Info, LevelFilter::Info),
    ("error_rolling_file", "error", LevelFilter::Warn, LevelFilter::Error),
];

/// Rolling file logging under `<log_dir>/<YYYY-MM-DD>/`, one file per level band.
pub fn setup_logger(settings: &Settings) -> Result<Handle, Box<dyn std::error::Error>> {
    let date = Local::now().format("%Y-%m-%d").to_string();
    let day_dir = settings.log_dir.join(&date);
    let mut config_builder = log4rs::config::runtime::ConfigBuilder::default();
    let mut root = Root::builder();

    for (name, stem, start, end) in LOG_FILES {
        let log_file_path = day_dir.join(format!("{}.favorites.log", stem));
        let roll_pattern = day_dir.join(format!("{}.favorites.rotate.{{}}.log", stem));
        let size_trigger = SizeTrigger::new(settings.log_rotate_size_kb * 1024);
        let size_roller = FixedWindowRoller::builder()
            .build(&roll_pattern.to_string_lossy(), settings.log_rotate_count)?;
        let size_trigger_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(size_roller));
        let size_rolled_appender = RollingFileAppender::builder()
            .append(true)
            .encoder(Box::new(PatternEncoder::new("{d}, {l}, {m}{n}")))
            .build(log_file_path, Box::new(size_trigger_policy))?;
        config_builder = config_builder.appender(
            Appender::builder()
                .filter(Box::new(LevelRangeFilter::new(start, end)))
                .build(name, Box::new(size_rolled_appender))
        );
        root = root.appender(name);
    }

    let config = config_builder.build(root.build(settings.log_level.to_filter()))?;
    let handle = log4rs::init_config(config)?;
    Ok(handle)
}
