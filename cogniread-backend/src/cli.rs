use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments shared by the API and worker binaries.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "CogniRead text pipeline")]
pub struct CliArgs {
    /// Path to configuration file (toml, yaml or json)
    #[arg(short = 'c', long = "config-path", env = "COGNIREAD_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_path_flags() {
        let long =
            CliArgs::try_parse_from(["cogniread-api", "--config-path", "/etc/cr.toml"]).unwrap();
        assert_eq!(long.config_path, Some(PathBuf::from("/etc/cr.toml")));

        let short = CliArgs::try_parse_from(["cogniread-worker", "-c", "cr.yaml"]).unwrap();
        assert_eq!(short.config_path, Some(PathBuf::from("cr.yaml")));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(CliArgs::try_parse_from(["cogniread-api", "--bogus"]).is_err());
    }
}
