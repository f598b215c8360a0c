use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "runout", about = "Inspect and download the outputs of a workflow run", version)]
#[command(group(ArgGroup::new("mode").args(["list_ports", "tree"]).multiple(false)))]
#[command(group(ArgGroup::new("read_mode").args(["range", "text", "stream"]).multiple(false)))]
pub struct Cli {
    /// URL of the run's output description (JSON).
    #[arg(value_name = "OUTPUT_URL")]
    pub output_url: Option<String>,

    /// List output ports with depth, total size and error status.
    #[arg(short = 'l', long = "list-ports", visible_alias = "lp")]
    pub list_ports: bool,

    /// Print the value tree of every port (or of --port when given).
    #[arg(short = 't', long)]
    pub tree: bool,

    /// With --tree, show the first PREVIEW_BYTES bytes of every data value.
    #[arg(long, requires = "tree")]
    pub preview: bool,

    /// Output port to read from.
    #[arg(short = 'p', long, value_name = "NAME")]
    pub port: Option<String>,

    /// Coordinates of the value within the port, one per list level: 0,2,1
    #[arg(short = 'c', long, value_name = "I,J,..", value_delimiter = ',')]
    pub coords: Vec<usize>,

    /// Inclusive byte range to read, e.g. 0-1023.
    #[arg(short = 'r', long, value_name = "LO-HI", requires = "port", value_parser = parse_range)]
    pub range: Option<(u64, u64)>,

    /// Print the value as text (invalid UTF-8 is replaced).
    #[arg(long, requires = "port")]
    pub text: bool,

    /// Stream the value to stdout without caching it.
    #[arg(long, requires = "port")]
    pub stream: bool,

    /// User name for HTTP Basic authentication.
    #[arg(long)]
    pub username: Option<String>,

    /// Password for HTTP Basic authentication.
    #[arg(long)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Disable coloured output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

fn parse_range(s: &str) -> Result<(u64, u64), String> {
    let (lo, hi) = s
        .split_once('-')
        .ok_or_else(|| format!("expected LO-HI, got '{}'", s))?;
    let lo = lo.trim().parse::<u64>().map_err(|e| format!("bad range start '{}': {}", lo, e))?;
    let hi = hi.trim().parse::<u64>().map_err(|e| format!("bad range end '{}': {}", hi, e))?;
    if lo > hi {
        return Err(format!("range start {} is after end {}", lo, hi));
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0-1023"), Ok((0, 1023)));
        assert_eq!(parse_range(" 5 - 5 "), Ok((5, 5)));
        assert!(parse_range("10-2").is_err());
        assert!(parse_range("10").is_err());
        assert!(parse_range("a-b").is_err());
    }

    #[test]
    fn test_coords_and_range_flags() {
        let cli = <Cli as Parser>::try_parse_from([
            "runout", "http://example.org/out.json", "--port", "result", "--coords", "1,0", "--range", "0-9",
        ])
        .unwrap();
        assert_eq!(cli.port.as_deref(), Some("result"));
        assert_eq!(cli.coords, vec![1, 0]);
        assert_eq!(cli.range, Some((0, 9)));
    }

    #[test]
    fn test_range_requires_port() {
        assert!(<Cli as Parser>::try_parse_from(["runout", "--range", "0-9"]).is_err());
    }
}
