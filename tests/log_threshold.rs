//! Log threshold tests
//!
//! The logger threshold is process-wide. These run in their own test
//! binary so no other test observes the changes.

use record_recipe::observability::{Logger, Severity};
use record_recipe::{Recipe, RecipeConfig};

#[test]
fn test_config_log_level_is_process_wide() {
    let before = Logger::threshold();

    // No level keeps the current threshold
    let _quiet = Recipe::new(RecipeConfig::default());
    assert_eq!(Logger::threshold(), before);

    let _verbose = Recipe::new(RecipeConfig::default().with_log_level(Severity::Trace));
    assert_eq!(Logger::threshold(), Severity::Trace);
    assert!(Logger::enabled(Severity::Trace));

    // Visible to recipes built before and after, the global one included
    let _later = Recipe::new(RecipeConfig::default());
    assert_eq!(Logger::threshold(), Severity::Trace);
    let _ = Recipe::global();
    assert_eq!(Logger::threshold(), Severity::Trace);

    let _strict = Recipe::new(RecipeConfig::default().with_log_level(Severity::Error));
    assert!(!Logger::enabled(Severity::Warn));
    assert!(Logger::enabled(Severity::Error));
}
