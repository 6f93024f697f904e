use clap::Parser;

#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let args = Args::parse_from(["qrcode-api"]);
        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn test_config_flag() {
        let args = Args::parse_from(["qrcode-api", "--config", "/etc/qrcode/config.toml"]);
        assert_eq!(args.config, "/etc/qrcode/config.toml");
    }
}
