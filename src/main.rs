//! Fieldcam: scheduled still capture and Drive upload for remote camera boards.

pub mod module;
use crate::module::define;
use crate::module::util::init::resource::init;

// The main function of Fieldcam
pub fn main() {
    // Prepare the resources by initializing the property struct
    let property = init();

    // Initialize the logging system with the data directory and the system name
    init_log(property.path.dir.data.as_str(), define::system::NAME);
    log::info!("Starting fieldcam run...");

    // Authorization failure is the only fatal class: everything else inside
    // the run is logged and survived.
    if let Err(e) = module::mission::run(&property) {
        log::error!("Run aborted: {}", e);
        std::process::exit(1);
    }
    log::info!("Run complete");
}

/// Initializes the logger system using the log4rs crate.
///
/// # Arguments
/// * `dir` - A string slice that holds the directory where the log file will be stored
/// * `name` - A string slice that holds the name of the logger and the log file
fn init_log(dir: &str, name: &str) {
    use crate::module::util::path::join;
    use log::LevelFilter;
    use log4rs::append::file::FileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{h({d} - {l}: {m}{n})}")))
        .build(join(&[
            dir,
            define::path::LOG_DIR,
            &format!("{}.log", name),
        ]))
        .unwrap();

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .unwrap();
    log4rs::init_config(config).unwrap();
}
