use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dwdxd")]
#[command(about = "Mirror DWD forecasts and station observations into a state store")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "TOML config file [default: $DWDX_CONFIG or config.toml]")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Run both updates once and exit")]
    pub once: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["dwdxd", "--config", "/etc/dwdx.toml", "--once"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dwdx.toml")));
        assert!(cli.once);
        assert!(!cli.json_logs);
    }
}
