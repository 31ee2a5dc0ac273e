use clap::Parser;

/// Trace the IPv4 and IPv6 routes to a host.
#[derive(Parser, Debug, Clone)]
#[command(name = "traceroute")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Host name or IP address to trace
    pub hostname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_single_hostname() {
        let cli = Cli::try_parse_from(["traceroute", "example.com"]).unwrap();
        assert_eq!(cli.hostname, "example.com");
    }

    #[test]
    fn test_missing_hostname_is_a_usage_error() {
        let err = Cli::try_parse_from(["traceroute"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
        assert!(err.to_string().contains("Usage: traceroute <HOSTNAME>"));
    }

    #[test]
    fn test_extra_argument_is_a_usage_error() {
        let err = Cli::try_parse_from(["traceroute", "example.com", "example.org"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_ne!(err.exit_code(), 0);
        assert!(err.to_string().contains("Usage: traceroute <HOSTNAME>"));
    }
}
