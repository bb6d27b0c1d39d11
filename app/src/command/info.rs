use std::path::PathBuf;

use triage_config::Config;
use triage_core::Report;

use super::load_config;

/// Strategy for displaying configuration information.
///
/// Shows where the config comes from, the extraction and output settings,
/// and the report fields extraction can write.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let source = match &config_path {
            Some(path) => path.display().to_string(),
            None => {
                let path = Config::config_path()?;
                if path.exists() {
                    path.display().to_string()
                } else {
                    format!("{} (not found, using defaults)", path.display())
                }
            }
        };
        let config = load_config(config_path.as_deref())?;

        println!("=== triage Configuration ===\n");

        println!("Config: {source}");
        println!();

        let extraction = &config.extraction;
        println!("Extraction:");
        println!("  Join Split Numbers: {}", extraction.join_split_numbers);
        println!("  Revision Policy: {:?}", extraction.revision_policy);
        println!("  Include Defaults: {}", extraction.patterns.include_defaults);
        if extraction.patterns.custom_patterns.is_empty() {
            println!("  Custom Patterns: (none)");
        } else {
            let names: Vec<&str> = extraction
                .patterns
                .custom_patterns
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            println!("  Custom Patterns: {}", names.join(", "));
        }
        println!();

        println!("Output:");
        println!("  Pretty: {}", config.output.pretty);
        println!();

        println!("Report Fields:");
        for path in Report::field_paths() {
            println!("  {path}");
        }

        Ok(())
    }
}
