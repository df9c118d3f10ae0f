use core::time::Duration;

use clap::Parser;
use pcap_http_decoder::DecoderConfig;

/// Print every HTTP request and response seen on the wire as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "pcap-http-decoder", version, about)]
pub(crate) struct Cli {
    /// Capture device; defaults to the first device pcap reports
    #[arg(long)]
    pub(crate) device: Option<String>,

    /// TCP port carrying the HTTP traffic
    #[arg(long, default_value_t = 80)]
    pub(crate) port: u16,

    /// Seconds an unfinished exchange may wait for its next segment
    #[arg(long, default_value_t = 100)]
    pub(crate) timeout_secs: u64,

    /// Bytes captured per packet
    #[arg(long, default_value_t = 65536)]
    pub(crate) snaplen: i32,
}

impl Cli {
    pub(crate) fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
