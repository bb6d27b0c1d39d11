use std::path::PathBuf;

use triage_core::Report;

use super::{build_engine, load_config};

/// Lists the matcher table in evaluation order.
///
/// Each capture group is shown with the field path it writes, its
/// normalization table size, and a marker when the typed report has no
/// such field.
#[derive(Debug, Clone, Copy)]
pub struct PatternsStrategy;

impl super::CommandStrategy for PatternsStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = load_config(config_path.as_deref())?;
        let engine = build_engine(&config)?;

        for (index, matcher) in engine.matchers().iter().enumerate() {
            println!("{:>2}. {}", index + 1, matcher.name());
            println!("    /{}/", matcher.regex().as_str());
            for (group, path) in matcher.groups().iter().zip(matcher.paths()) {
                let mapping = matcher
                    .mapping(group)
                    .map_or_else(String::new, |table| format!(" [{} tokens]", table.len()));
                let unsupported = if Report::supports(path) {
                    ""
                } else {
                    " (not a report field)"
                };
                println!("    {group} -> {path}{mapping}{unsupported}");
            }
        }

        Ok(())
    }
}
