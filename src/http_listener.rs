use std::io::Write;
use std::time::SystemTime;

use pcap_http_decoder::{Decoder, DecoderConfig, Message, Segment};
use tracing::{debug, info, warn};

use crate::cli::Cli;

/// A captured link-layer frame and the time it was seen.
pub(crate) struct CapturedFrame {
    pub(crate) timestamp: SystemTime,
    pub(crate) data: Vec<u8>,
}

/// Trait that platform-specific listeners implement. Implementors must provide a frame iterator.
/// The trait provides a default `listen()` which owns the decoding loop and writes every
/// completed message as one JSON line.
pub(crate) trait HttpListener {
    /// Return an iterator of captured frames.
    /// Implementations may return an error if the capture cannot be set up.
    fn frames(&self) -> anyhow::Result<Box<dyn Iterator<Item = CapturedFrame>>>;

    /// Decode frames produced by `frames()` until the capture ends.
    /// Returns the number of messages written.
    fn listen<W: Write>(&self, config: DecoderConfig, out: &mut W) -> anyhow::Result<usize> {
        let mut decoder = Decoder::with_config(config);
        let mut written = 0;
        for frame in self.frames()? {
            let Some(segment) = Segment::from_packet(&frame.data, frame.timestamp) else {
                continue;
            };
            match decoder.decode(&segment) {
                Ok(Some(message)) => {
                    Self::write_message(&message, out)?;
                    written += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        seq = segment.seq_num,
                        ack = segment.ack_num,
                        "Skipping undecodable segment: {e}"
                    );
                }
            }
        }
        debug!(pending = decoder.pending(), "Capture ended");
        Ok(written)
    }

    fn write_message<W: Write>(message: &Message, out: &mut W) -> anyhow::Result<()> {
        serde_json::to_writer(&mut *out, message)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

pub(super) struct PlatformListener {
    #[cfg_attr(target_os = "windows", allow(dead_code))]
    device: Option<String>,
    port: u16,
    #[cfg_attr(target_os = "windows", allow(dead_code))]
    snaplen: i32,
}

impl PlatformListener {
    pub(super) fn from_cli(cli: &Cli) -> Self {
        Self {
            device: cli.device.clone(),
            port: cli.port,
            snaplen: cli.snaplen,
        }
    }
}

#[cfg(target_os = "windows")]
impl HttpListener for PlatformListener {
    fn frames(&self) -> anyhow::Result<Box<dyn Iterator<Item = CapturedFrame>>> {
        let mut cap = pktmon::Capture::new()?;

        // Capture HTTP traffic in both directions on the configured port
        cap.add_filter(pktmon::filter::PktMonFilter {
            name: "HTTP Filter".to_string(),
            port: self.port.into(),
            transport_protocol: Some(pktmon::filter::TransportProtocol::TCP),
            ..Default::default()
        })?;
        cap.start()?;
        info!(port = self.port, "Monitoring with pktmon");

        // pktmon does not report capture times, so frames are stamped on arrival.
        let iter = core::iter::from_fn(move || {
            loop {
                match cap.next_packet() {
                    Ok(packet) => {
                        return Some(CapturedFrame {
                            timestamp: SystemTime::now(),
                            data: packet.payload.to_vec(),
                        });
                    }
                    Err(e) => {
                        warn!("Error reading packet: {e}");
                    }
                }
            }
        });

        Ok(Box::new(iter))
    }
}

#[cfg(target_os = "linux")]
use anyhow::Context;
#[cfg(target_os = "linux")]
impl HttpListener for PlatformListener {
    fn frames(&self) -> anyhow::Result<Box<dyn Iterator<Item = CapturedFrame>>> {
        let device = match &self.device {
            Some(name) => pcap::Device::from(name.as_str()),
            None => pcap::Device::lookup()?.context("Failed to find network device")?,
        };

        info!(
            "Monitoring device: {} ({})",
            device.name,
            device.desc.as_deref().unwrap_or("no description")
        );

        let mut cap = pcap::Capture::from_device(device)?
            .promisc(true)
            .snaplen(self.snaplen)
            .timeout(100) // Short timeout for responsive capture
            .buffer_size(1_000_000)
            .open()?;

        // Capture HTTP traffic in both directions on the configured port
        cap.filter(&format!("tcp port {}", self.port), true)?;

        // The closure loops on timeouts and only returns None on fatal errors (ending the iterator).
        let iter = core::iter::from_fn(move || {
            loop {
                match cap.next_packet() {
                    Ok(packet) => {
                        return Some(CapturedFrame {
                            timestamp: capture_time(packet.header.ts.tv_sec, packet.header.ts.tv_usec),
                            data: packet.data.to_vec(),
                        });
                    }
                    Err(pcap::Error::TimeoutExpired) => {}
                    Err(e) => {
                        warn!("Error reading packet: {e}");
                        return None;
                    }
                }
            }
        });

        Ok(Box::new(iter))
    }
}

/// Convert a pcap `timeval` into a `SystemTime`; negative fields clamp to zero.
#[cfg(target_os = "linux")]
fn capture_time<S, U>(secs: S, micros: U) -> SystemTime
where
    u64: TryFrom<S>,
    u64: TryFrom<U>,
{
    SystemTime::UNIX_EPOCH
        + core::time::Duration::from_secs(non_negative(secs))
        + core::time::Duration::from_micros(non_negative(micros))
}

#[cfg(target_os = "linux")]
fn non_negative<T>(value: T) -> u64
where
    u64: TryFrom<T>,
{
    u64::try_from(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::time::UNIX_EPOCH;

    struct DummyListener {
        frames: Vec<Vec<u8>>,
    }

    impl HttpListener for DummyListener {
        fn frames(&self) -> anyhow::Result<Box<dyn Iterator<Item = CapturedFrame>>> {
            let frames = self.frames.clone().into_iter().map(|data| CapturedFrame {
                timestamp: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
                data,
            });
            Ok(Box::new(frames))
        }
    }

    /// Ethernet + IPv4 + TCP frame around `payload`.
    fn frame(seq: u32, ack: u32, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 54];
        frame[12..14].copy_from_slice(&[0x08, 0x00]);
        frame[14] = 0x45;
        let total = u16::try_from(40 + payload.len()).unwrap();
        frame[16..18].copy_from_slice(&total.to_be_bytes());
        frame[23] = 6;
        frame[26..30].copy_from_slice(&[192, 168, 1, 2]);
        frame[30..34].copy_from_slice(&[10, 0, 0, 1]);
        frame[36..38].copy_from_slice(&80u16.to_be_bytes());
        frame[38..42].copy_from_slice(&seq.to_be_bytes());
        frame[42..46].copy_from_slice(&ack.to_be_bytes());
        frame[46] = 0x50;
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn test_listen_writes_json_lines() {
        let listener = DummyListener {
            frames: vec![
                frame(1, 500, b"GET /status?verbose=1 HTTP/1.1\r\nHost: example.com\r\n\r\n"),
                vec![0u8; 8],
                frame(500, 60, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok"),
            ],
        };
        let mut out = Vec::new();

        let written = listener.listen(DecoderConfig::default(), &mut out).unwrap();

        assert_eq!(written, 2);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0]["kind"], "request");
        assert_eq!(lines[0]["path"], "/status");
        assert_eq!(lines[0]["parameters"]["verbose"], "1");
        assert_eq!(lines[0]["src_host"], "192.168.1.2");
        assert_eq!(lines[1]["kind"], "response");
        assert_eq!(lines[1]["status"], 200);
        assert_eq!(lines[1]["body"], "ok");
        assert_eq!(lines[0]["exchange_id"], lines[1]["exchange_id"]);
    }

    #[test]
    fn test_listen_survives_malformed_segment() {
        let listener = DummyListener {
            frames: vec![
                frame(1, 7, b"HTTP/1.1 abc\r\n\r\n"),
                frame(2, 9, b"DELETE /item HTTP/1.1\r\n\r\n"),
            ],
        };
        let mut out = Vec::new();

        let written = listener.listen(DecoderConfig::default(), &mut out).unwrap();

        assert_eq!(written, 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_capture_time() {
        assert_eq!(
            capture_time(5_i64, 250_000_i64),
            UNIX_EPOCH + Duration::from_millis(5_250)
        );
        assert_eq!(capture_time(-1_i64, -1_i64), UNIX_EPOCH);
    }
}
