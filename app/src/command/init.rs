use triage_config::Config;

/// Strategy for initializing the configuration.
///
/// Writes the default configuration to `~/triage/config.json`. An existing
/// file is never overwritten.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        Config::create_config()
    }
}
